use crate::{
    Config, WeatherRecord,
    error::{Error, Result},
    provider::weatherbit::WeatherbitProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod weatherbit;

/// Source of current conditions for a city.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(&self, city: &str) -> Result<WeatherRecord>;
}

/// Stand-in used when no credential is configured: the weather tool stays
/// registered but every call explains what is missing.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredProvider;

#[async_trait]
impl WeatherProvider for UnconfiguredProvider {
    async fn current_weather(&self, _city: &str) -> Result<WeatherRecord> {
        Err(Error::MissingConfiguration("weather API key".to_string()))
    }
}

/// Construct the weather provider described by the config.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn WeatherProvider>> {
    let Some(api_key) = config.weather_api_key() else {
        tracing::warn!(
            "No weather API key configured. Hint: run `opsbot configure` or set {}.",
            crate::config::API_KEY_ENV
        );
        return Ok(Arc::new(UnconfiguredProvider));
    };

    let provider = WeatherbitProvider::builder(api_key)
        .base_url(config.weather.base_url.clone())
        .timeout(config.weather.timeout())
        .build()?;

    Ok(Arc::new(provider))
}
