use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use opsbot_core::{
    Config, ConversationBuffer, GeoDirectory, ToolGateway, provider_from_config,
    tools::{TIME_TOOL_NAME, WEATHER_TOOL_NAME},
};
use tokio::io::BufReader;

use crate::{
    assistant::{Assistant, run_repl},
    model::OllamaChat,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "opsbot", version, about = "Operations assistant with time and weather tools")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). Logs go to stderr.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interactive conversation backed by a local Ollama model.
    Chat {
        /// Override the configured model name.
        #[arg(long)]
        model: Option<String>,
    },

    /// Show the current time in a country's capital.
    Time {
        /// 3-letter country code, e.g. GBR.
        country: String,
    },

    /// Show the current weather in a country's capital.
    Weather {
        /// 3-letter country code, e.g. JPN.
        country: String,
    },

    /// Print the tool definitions offered to the model, as JSON.
    Tools,

    /// Interactively store the weather API key and model name.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Chat { model } => {
                let mut config = Config::load()?;
                if let Some(model) = model {
                    config.model.name = model;
                }
                chat(&config).await
            }
            Command::Time { country } => {
                let out = gateway(&Config::load()?)?.invoke(TIME_TOOL_NAME, &country).await;
                println!("{out}");
                Ok(())
            }
            Command::Weather { country } => {
                let out = gateway(&Config::load()?)?.invoke(WEATHER_TOOL_NAME, &country).await;
                println!("{out}");
                Ok(())
            }
            Command::Tools => {
                let defs = gateway(&Config::load()?)?.definitions();
                println!("{}", serde_json::to_string_pretty(&defs)?);
                Ok(())
            }
            Command::Configure => configure(),
        }
    }
}

fn gateway(config: &Config) -> anyhow::Result<ToolGateway> {
    let provider =
        provider_from_config(config).context("Failed to set up the weather provider")?;
    Ok(ToolGateway::standard(Arc::new(GeoDirectory::builtin()), provider))
}

async fn chat(config: &Config) -> anyhow::Result<()> {
    let model = OllamaChat::from_config(&config.model)?;
    let memory = ConversationBuffer::new(config.memory.max_turns);
    let mut assistant = Assistant::new(model, gateway(config)?, memory);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    run_repl(&mut assistant, stdin, &mut stdout).await
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("Weatherbit API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_weather_api_key(api_key);
    }

    let current_model = config.model.name.clone();
    config.model.name = Text::new("Ollama model:").with_default(&current_model).prompt()?;

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());

    Ok(())
}
