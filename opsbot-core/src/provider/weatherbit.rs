use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::ACCEPT};
use serde::Deserialize;
use std::{fmt, time::Duration};
use tracing::{debug, error, warn};

use crate::{
    error::{Error, Result},
    model::WeatherRecord,
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherbit.io/v2.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Weatherbit "current observations" client.
#[derive(Clone)]
pub struct WeatherbitProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

// Hand-written so the credential never reaches a log line.
impl fmt::Debug for WeatherbitProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherbitProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl WeatherbitProvider {
    pub fn builder(api_key: impl Into<String>) -> WeatherbitProviderBuilder {
        WeatherbitProviderBuilder {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_current(&self, city: &str) -> Result<WeatherRecord> {
        let url = format!("{}/current", self.base_url.trim_end_matches('/'));
        debug!(url = url.as_str(), city, "calling weather provider");

        let res = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(&[("city", city), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status();
        let body = res.text().await.map_err(transport_error)?;

        if status != StatusCode::OK {
            let body = truncate_body(&body);
            error!(status = status.as_u16(), body = body.as_str(), city, "weather request failed");
            return Err(Error::UpstreamError { status: status.as_u16(), body });
        }

        parse_current(city, &body)
    }
}

#[derive(Debug)]
pub struct WeatherbitProviderBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl WeatherbitProviderBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Upper bound for the whole request, connect through body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<WeatherbitProvider> {
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::TransportFailure(format!("failed to build HTTP client: {e}")))?;

        Ok(WeatherbitProvider { api_key: self.api_key, base_url: self.base_url, http })
    }
}

#[async_trait]
impl WeatherProvider for WeatherbitProvider {
    async fn current_weather(&self, city: &str) -> Result<WeatherRecord> {
        let city = city.trim();
        if city.is_empty() {
            return Err(Error::InvalidArgument("City name cannot be empty.".to_string()));
        }

        self.fetch_current(city).await
    }
}

#[derive(Debug, Deserialize)]
struct WbResponse {
    #[serde(default)]
    data: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct WbDescription {
    description: String,
}

#[derive(Debug, Deserialize)]
struct WbObservation {
    temp: f64,
    app_temp: f64,
    city_name: String,
    datetime: String,
    weather: WbDescription,
}

impl From<WbObservation> for WeatherRecord {
    fn from(obs: WbObservation) -> Self {
        WeatherRecord {
            city: obs.city_name,
            temperature_c: obs.temp,
            apparent_temperature_c: obs.app_temp,
            observed_at: obs.datetime,
            description: obs.weather.description,
        }
    }
}

/// Only the first station is used; later entries are never decoded.
fn parse_current(city: &str, body: &str) -> Result<WeatherRecord> {
    let parsed: WbResponse = serde_json::from_str(body).map_err(|e| {
        error!(city, error = %e, body = %truncate_body(body), "unparseable weather response");
        Error::ParseFailure(e.to_string())
    })?;

    let Some(first) = parsed.data.and_then(|d| d.into_iter().next()) else {
        warn!(city, body = %truncate_body(body), "weather response contained no data");
        return Err(Error::EmptyResult(city.to_string()));
    };

    let observation: WbObservation = serde_json::from_value(first).map_err(|e| {
        error!(city, error = %e, "weather observation did not match the expected schema");
        Error::ParseFailure(e.to_string())
    })?;

    Ok(observation.into())
}

fn transport_error(err: reqwest::Error) -> Error {
    let reason = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };

    // The URL carries the API key in its query string.
    Error::TransportFailure(format!("{reason}: {}", err.without_url()))
}

/// Caps an upstream body at 200 characters for logs and error text.
pub fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> WeatherbitProvider {
        WeatherbitProvider::builder("TEST_KEY").base_url(server.uri()).build().unwrap()
    }

    fn observation(city: &str, temp: f64) -> serde_json::Value {
        json!({
            "temp": temp,
            "app_temp": 17.0,
            "city_name": city,
            "datetime": "2024-05-01:11",
            "weather": { "description": "Clear Sky", "icon": "c01d", "code": 800 },
            "wind_spd": 3.2,
            "rh": 61
        })
    }

    #[tokio::test]
    async fn returns_first_observation_and_ignores_unknown_fields() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .and(query_param("city", "New York"))
            .and(query_param("key", "TEST_KEY"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 2,
                "data": [observation("New York", 21.4), { "unexpected": true }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let record = provider_for(&server).current_weather("New York").await.unwrap();

        assert_eq!(record.city, "New York");
        assert_eq!(record.temperature_c, 21.4);
        assert_eq!(record.apparent_temperature_c, 17.0);
        assert_eq!(record.observed_at, "2024-05-01:11");
        assert_eq!(record.description, "Clear Sky");
    }

    #[tokio::test]
    async fn non_200_is_upstream_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
            .mount(&server)
            .await;

        let err = provider_for(&server).current_weather("London").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamError);
        assert!(matches!(err, Error::UpstreamError { status: 500, .. }));
        assert!(!err.user_message().contains("backend exploded"));
    }

    #[tokio::test]
    async fn empty_or_missing_data_is_empty_result() {
        for body in [json!({ "data": [] }), json!({ "count": 0 }), json!({ "data": null })] {
            let server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/current"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&server)
                .await;

            let err = provider_for(&server).current_weather("Paris").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::EmptyResult);
        }
    }

    #[tokio::test]
    async fn malformed_body_is_parse_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = provider_for(&server).current_weather("Paris").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
    }

    #[tokio::test]
    async fn schema_mismatch_is_parse_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "city_name": "Paris", "temp": "warm" }]
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server).current_weather("Paris").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
    }

    #[tokio::test]
    async fn blank_city_never_hits_the_network() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = provider_for(&server).current_weather("   ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn slow_upstream_times_out_as_transport_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": [observation("Tokyo", 18.5)] }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let provider = WeatherbitProvider::builder("TEST_KEY")
            .base_url(server.uri())
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();

        let err = provider.current_weather("Tokyo").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert!(!err.to_string().contains("TEST_KEY"));
    }

    #[tokio::test]
    async fn refused_connection_is_transport_failure() {
        let provider = WeatherbitProvider::builder("TEST_KEY")
            .base_url("http://127.0.0.1:1")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        let err = provider.current_weather("Tokyo").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
    }

    #[test]
    fn debug_output_redacts_key() {
        let provider = WeatherbitProvider::builder("SUPER_SECRET").build().unwrap();
        assert!(!format!("{provider:?}").contains("SUPER_SECRET"));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
