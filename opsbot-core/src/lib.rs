//! Core library for the `opsbot` assistant.
//!
//! This crate defines:
//! - Country → capital → timezone resolution
//! - The weather provider client and its failure taxonomy
//! - Windowed conversation memory
//! - The string-in, string-out tool gateway a language model calls into
//!
//! It is used by `opsbot-cli`, but any orchestration layer can drive the
//! [`ToolGateway`] directly.

pub mod config;
pub mod error;
pub mod geo;
pub mod memory;
pub mod model;
pub mod provider;
pub mod time;
pub mod tools;
pub mod weather;

pub use config::{Config, MemoryConfig, ModelConfig, WeatherConfig};
pub use error::{Error, ErrorKind, Result};
pub use geo::GeoDirectory;
pub use memory::{ConversationBuffer, ConversationTurn, Role};
pub use model::{CapitalEntry, CountryCode, WeatherRecord};
pub use provider::{WeatherProvider, provider_from_config};
pub use time::TimeResolver;
pub use tools::{Tool, ToolDefinition, ToolGateway};
pub use weather::WeatherResolver;
