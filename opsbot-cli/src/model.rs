//! Chat-model adapter for a local Ollama server.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use opsbot_core::{ConversationTurn, ModelConfig, Role, provider::weatherbit::truncate_body};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl ChatMessage {
    fn plain(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
            tool_calls: Vec::new(),
            tool_name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain("assistant", content)
    }

    pub fn tool(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self { tool_name: Some(name.into()), ..Self::plain("tool", content) }
    }
}

impl From<&ConversationTurn> for ChatMessage {
    fn from(turn: &ConversationTurn) -> Self {
        match turn.role {
            Role::User => Self::user(turn.content.clone()),
            Role::Assistant => Self::assistant(turn.content.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// The external language model: sees the conversation and tool schemas,
/// answers with text or with tool calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ChatMessage>;
}

#[async_trait]
impl<T: ChatModel + ?Sized> ChatModel for Arc<T> {
    async fn chat(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ChatMessage> {
        (**self).chat(messages, tools).await
    }
}

#[derive(Debug, Clone)]
pub struct OllamaChat {
    base_url: String,
    model: String,
    temperature: f32,
    http: Client,
}

impl OllamaChat {
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for Ollama")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.name.clone(),
            temperature: config.temperature,
            http,
        })
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "<[Value]>::is_empty")]
    tools: &'a [Value],
    stream: bool,
    options: Value,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: Option<ChatMessage>,
}

#[async_trait]
impl ChatModel for OllamaChat {
    async fn chat(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ChatMessage> {
        let url = format!("{}/api/chat", self.base_url);

        let payload = OllamaRequest {
            model: &self.model,
            messages,
            tools,
            stream: false,
            options: json!({ "temperature": self.temperature }),
        };

        info!(model = self.model.as_str(), messages = messages.len(), "sending request to Ollama");

        let res = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Ollama at {}", self.base_url))?;

        let status = res.status();
        let body = res.text().await.context("Failed to read Ollama response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Ollama request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: OllamaResponse =
            serde_json::from_str(&body).context("Failed to parse Ollama chat JSON")?;
        debug!(body = %truncate_body(&body), "received response from Ollama");

        parsed.message.ok_or_else(|| anyhow!("Ollama response contained no message"))
    }
}
