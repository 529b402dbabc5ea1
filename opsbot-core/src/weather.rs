use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    geo::GeoDirectory,
    model::WeatherRecord,
    provider::WeatherProvider,
};

/// Country code in, JSON weather snapshot (or an error sentence) out.
#[derive(Debug, Clone)]
pub struct WeatherResolver {
    directory: Arc<GeoDirectory>,
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherResolver {
    pub fn new(directory: Arc<GeoDirectory>, provider: Arc<dyn WeatherProvider>) -> Self {
        Self { directory, provider }
    }

    pub async fn current_weather_in_capital(&self, country_code: &str) -> String {
        info!(country_code, "current weather in capital requested");

        match self.lookup(country_code).await {
            Ok((capital, record)) => match serde_json::to_string(&record) {
                Ok(json) => {
                    info!(
                        capital = capital.as_str(),
                        country_code,
                        weather = json.as_str(),
                        "weather resolved"
                    );
                    json
                }
                Err(e) => {
                    let err = Error::ParseFailure(format!("failed to serialize weather: {e}"));
                    warn!(country_code, error = %err, "weather lookup failed");
                    err.user_message()
                }
            },
            Err(err) => {
                warn!(country_code, error = %err, "weather lookup failed");
                err.user_message()
            }
        }
    }

    async fn lookup(&self, country_code: &str) -> Result<(String, WeatherRecord)> {
        let (_, capital) = self.directory.capital_of(country_code)?;
        let capital = capital.to_string();

        let record = self.provider.current_weather(&capital).await?;
        Ok((capital, record))
    }
}
