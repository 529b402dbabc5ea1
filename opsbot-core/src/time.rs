use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    geo::GeoDirectory,
};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

#[derive(Debug, Clone)]
pub struct TimeResolver {
    directory: Arc<GeoDirectory>,
}

impl TimeResolver {
    pub fn new(directory: Arc<GeoDirectory>) -> Self {
        Self { directory }
    }

    /// Tool entry point: always yields a string, success or not.
    pub fn current_time_in_capital(&self, country_code: &str) -> String {
        self.current_time_in_capital_at(country_code, Utc::now())
    }

    pub fn current_time_in_capital_at(&self, country_code: &str, now: DateTime<Utc>) -> String {
        info!(country_code, "current time in capital requested");

        match self.describe(country_code, now) {
            Ok(msg) => {
                info!(result = msg.as_str(), "time resolved");
                msg
            }
            Err(err) => {
                warn!(country_code, error = %err, "time lookup failed");
                err.user_message()
            }
        }
    }

    fn describe(&self, country_code: &str, now: DateTime<Utc>) -> Result<String> {
        let entry = self.directory.resolve_capital(country_code)?;

        let tz: Tz = entry.timezone.parse().map_err(|e| Error::ConfigurationInconsistency {
            capital: entry.city.clone(),
            detail: format!("unrecognised timezone '{}': {e}", entry.timezone),
        })?;

        let local = now.with_timezone(&tz);

        Ok(format!(
            "The current time in {} ({}) is: {}",
            entry.city,
            entry.country,
            local.format(TIME_FORMAT)
        ))
    }
}
