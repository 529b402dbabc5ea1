use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Upper-cased, trimmed country identifier, e.g. `GBR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountryCode(String);

impl CountryCode {
    /// Normalizes raw tool input. Blank input is an argument error, not a
    /// lookup miss.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidArgument("Country code cannot be empty.".to_string()));
        }

        Ok(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A country resolved to its designated city and IANA zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapitalEntry {
    pub country: CountryCode,
    pub city: String,
    pub timezone: String,
}

/// Normalized snapshot of current conditions, as handed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    pub temperature_c: f64,
    pub apparent_temperature_c: f64,
    /// Provider-local observation time, kept verbatim (e.g. `2024-05-01:11`).
    pub observed_at: String,
    pub description: String,
}
