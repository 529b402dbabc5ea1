//! The callable surface handed to a language model.
//!
//! Every tool takes one string and returns one string. Failures come back as
//! `Error: ...` sentences so the model can relay them; nothing is raised
//! across this boundary.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    geo::GeoDirectory, provider::WeatherProvider, time::TimeResolver, weather::WeatherResolver,
};

pub const TIME_TOOL_NAME: &str = "get_current_time_in_capital";
pub const WEATHER_TOOL_NAME: &str = "get_current_weather_in_capital";

const COUNTRY_CODE_PARAM: &str = "country_code";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
}

/// Name, usage text and JSON schema of a tool, as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    /// The `{"type": "function", ...}` shape used by OpenAI-style chat APIs.
    pub fn function_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameter(&self) -> ToolParameter;

    /// Must not panic; the gateway still guards against it.
    async fn call(&self, argument: &str) -> String;

    fn definition(&self) -> ToolDefinition {
        let param = self.parameter();

        let mut properties = serde_json::Map::new();
        properties.insert(
            param.name.clone(),
            json!({ "type": "string", "description": param.description }),
        );

        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": [param.name],
            }),
        }
    }
}

fn country_code_parameter() -> ToolParameter {
    ToolParameter {
        name: COUNTRY_CODE_PARAM.to_string(),
        description: "3-letter country code, e.g. GBR, USA, FRA".to_string(),
    }
}

fn supported_codes_line(directory: &GeoDirectory) -> String {
    format!("Supported codes include {}.", directory.supported_codes().join(", "))
}

pub struct TimeTool {
    resolver: TimeResolver,
    description: String,
}

impl TimeTool {
    pub fn new(directory: Arc<GeoDirectory>) -> Self {
        let description = format!(
            "Gets the current date and time in the capital city of a given country. \
             Provide the country using its 3-letter code (e.g., GBR, USA, FRA). {}",
            supported_codes_line(&directory)
        );

        Self { resolver: TimeResolver::new(directory), description }
    }
}

#[async_trait]
impl Tool for TimeTool {
    fn name(&self) -> &str {
        TIME_TOOL_NAME
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameter(&self) -> ToolParameter {
        country_code_parameter()
    }

    async fn call(&self, argument: &str) -> String {
        self.resolver.current_time_in_capital(argument)
    }
}

pub struct WeatherTool {
    resolver: WeatherResolver,
    description: String,
}

impl WeatherTool {
    pub fn new(directory: Arc<GeoDirectory>, provider: Arc<dyn WeatherProvider>) -> Self {
        let description = format!(
            "Gets the current weather conditions in the capital city of a given country. \
             Provide the country using its 3-letter code (e.g., GBR, USA, FRA). {}",
            supported_codes_line(&directory)
        );

        Self { resolver: WeatherResolver::new(directory, provider), description }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        WEATHER_TOOL_NAME
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameter(&self) -> ToolParameter {
        country_code_parameter()
    }

    async fn call(&self, argument: &str) -> String {
        self.resolver.current_weather_in_capital(argument).await
    }
}

/// Registry the orchestration layer calls into by tool name.
///
/// Invocations run on the ambient tokio runtime and are awaited in place, so
/// one call finishes before the next begins.
#[derive(Clone, Default)]
pub struct ToolGateway {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time and weather tools over a shared directory.
    pub fn standard(directory: Arc<GeoDirectory>, provider: Arc<dyn WeatherProvider>) -> Self {
        Self::new()
            .with_tool(Arc::new(TimeTool::new(directory.clone())))
            .with_tool(Arc::new(WeatherTool::new(directory, provider)))
    }

    /// A later tool with the same name replaces the earlier one.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub async fn invoke(&self, name: &str, argument: &str) -> String {
        let Some(tool) = self.find(name) else {
            warn!(tool = name, "unknown tool requested");
            return format!("Error: Unknown tool '{name}'.");
        };

        info!(tool = name, argument, "invoking tool");

        let tool = Arc::clone(tool);
        let argument = argument.to_string();

        // A panic inside the tool surfaces as a JoinError instead of unwinding
        // into the caller.
        match tokio::spawn(async move { tool.call(&argument).await }).await {
            Ok(output) => output,
            Err(e) => {
                error!(tool = name, error = %e, "tool invocation aborted");
                format!("Error: Tool '{name}' failed unexpectedly.")
            }
        }
    }

    /// Accepts the arguments as a model sends them: a bare string, or an
    /// object holding the tool's single parameter.
    pub async fn invoke_with_arguments(&self, name: &str, arguments: &Value) -> String {
        let Some(tool) = self.find(name) else {
            warn!(tool = name, "unknown tool requested");
            return format!("Error: Unknown tool '{name}'.");
        };

        let param = tool.parameter().name;

        let argument = match arguments {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => match map.get(&param) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(_) => None,
                // Models occasionally rename the only parameter.
                None if map.len() == 1 => {
                    map.values().next().and_then(Value::as_str).map(str::to_string)
                }
                None => None,
            },
            _ => None,
        };

        match argument {
            Some(argument) => self.invoke(name, &argument).await,
            None => {
                warn!(tool = name, %arguments, "tool called without a usable argument");
                format!("Error: Tool '{name}' expects a string argument '{param}'.")
            }
        }
    }
}
