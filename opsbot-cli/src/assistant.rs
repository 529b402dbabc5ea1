//! The conversation loop: windowed memory, model round-trips and tool calls.

use anyhow::{Result, bail};
use opsbot_core::{ConversationBuffer, ConversationTurn, ToolGateway};
use serde_json::Value;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::model::{ChatMessage, ChatModel};

pub const SYSTEM_PROMPT: &str = "\
You are a helpful operations assistant.
Answer the user's questions politely and use the available tools when necessary.
If the user asks for the time in a country, use the 'get_current_time_in_capital' tool.
If the user asks for the weather or temperature in a country, use the 'get_current_weather_in_capital' tool.

If the user asks for the time without specifying a country, ask the user which country they want the time for.

Provide clear and concise answers.
If a tool returns an error, inform the user politely.";

/// Tool-call rounds allowed before a single user message is abandoned.
const MAX_TOOL_ROUNDS: usize = 5;

pub struct Assistant<M> {
    model: M,
    gateway: ToolGateway,
    memory: ConversationBuffer,
    tool_schemas: Vec<Value>,
}

impl<M: ChatModel> Assistant<M> {
    pub fn new(model: M, gateway: ToolGateway, memory: ConversationBuffer) -> Self {
        let tool_schemas = gateway.definitions().iter().map(|d| d.function_schema()).collect();
        Self { model, gateway, memory, tool_schemas }
    }

    pub fn memory(&self) -> &ConversationBuffer {
        &self.memory
    }

    /// Answers one user message. Tool traffic for the turn is kept out of the
    /// windowed memory; only the user message and final answer are stored.
    pub async fn reply(&mut self, user_message: &str) -> Result<String> {
        self.memory.append(ConversationTurn::user(user_message));

        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
        messages.extend(self.memory.iter().map(ChatMessage::from));

        for round in 0..=MAX_TOOL_ROUNDS {
            let reply = self.model.chat(&messages, &self.tool_schemas).await?;

            if reply.tool_calls.is_empty() {
                let answer = reply.content.trim().to_string();
                self.memory.append(ConversationTurn::assistant(answer.clone()));
                return Ok(answer);
            }
            if round == MAX_TOOL_ROUNDS {
                break;
            }

            let calls = reply.tool_calls.clone();
            messages.push(reply);

            for call in calls {
                let arguments = normalize_arguments(call.function.arguments);
                let output =
                    self.gateway.invoke_with_arguments(&call.function.name, &arguments).await;
                debug!(tool = call.function.name.as_str(), output = output.as_str(), "tool result");
                messages.push(ChatMessage::tool(call.function.name, output));
            }
        }

        warn!(rounds = MAX_TOOL_ROUNDS, "model kept requesting tools");
        bail!("The model requested tools {MAX_TOOL_ROUNDS} times without answering")
    }
}

/// Some models send the arguments object as a JSON-encoded string.
fn normalize_arguments(arguments: Value) -> Value {
    if let Value::String(raw) = &arguments {
        if let Ok(parsed @ Value::Object(_)) = serde_json::from_str::<Value>(raw) {
            return parsed;
        }
    }
    arguments
}

/// Reads one line at a time until `exit` or end of input.
pub async fn run_repl<M, R, W>(assistant: &mut Assistant<M>, input: R, out: &mut W) -> Result<()>
where
    M: ChatModel,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "Chatbot started. Type 'exit' to quit.")?;
    writeln!(
        out,
        "Ask me about the time/weather in a country (e.g., 'What time is it in the UK?', \
         'Current time in France?', 'What is the time and weather in England?')."
    )?;

    let mut lines = input.lines();

    loop {
        write!(out, "\nUser: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") {
            break;
        }
        if message.is_empty() {
            continue;
        }

        match assistant.reply(message).await {
            Ok(answer) => {
                debug!(remembered = assistant.memory().len(), "turn complete");
                writeln!(out, "Bot: {answer}")?;
            }
            Err(e) => {
                warn!(error = %e, "assistant turn failed");
                writeln!(out, "Bot: Sorry, I could not answer that ({e:#}).")?;
            }
        }
    }

    writeln!(out, "Chatbot stopped.")?;
    Ok(())
}
