//! Binary crate for the `opsbot` command-line assistant.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - The chat loop that connects a language model to the core tools

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod assistant;
mod cli;
mod model;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_tracing(cmd.verbose);
    cmd.run().await
}

/// Logs go to stderr so they never interleave with the conversation.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "opsbot_core=warn,opsbot_cli=warn",
        1 => "opsbot_core=info,opsbot_cli=info",
        _ => "opsbot_core=debug,opsbot_cli=debug",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
