use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{memory::DEFAULT_MAX_TURNS, provider::weatherbit};

/// Environment variable that overrides the stored weather API key.
pub const API_KEY_ENV: &str = "WEATHERBIT_API_KEY";

/// Weather provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl WeatherConfig {
    /// A zero timeout would fail every request, so it means "use the default".
    pub fn timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => weatherbit::DEFAULT_TIMEOUT,
            secs => Duration::from_secs(secs),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: weatherbit::DEFAULT_BASE_URL.to_string(),
            timeout_secs: weatherbit::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Chat model served by a local Ollama instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub name: String,
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            name: "mistral-small:latest".to_string(),
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub max_turns: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { max_turns: DEFAULT_MAX_TURNS }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [weather]
/// api_key = "..."
///
/// [model]
/// name = "mistral-small:latest"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub weather: WeatherConfig,
    pub model: ModelConfig,
    pub memory: MemoryConfig,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "opsbot", "opsbot")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key from the environment, falling back to the stored one.
    pub fn weather_api_key(&self) -> Option<String> {
        self.weather_api_key_with(std::env::var(API_KEY_ENV).ok())
    }

    fn weather_api_key_with(&self, from_env: Option<String>) -> Option<String> {
        let non_blank = |key: String| Some(key.trim().to_string()).filter(|k| !k.is_empty());

        from_env.and_then(non_blank).or_else(|| self.weather.api_key.clone().and_then(non_blank))
    }

    pub fn set_weather_api_key(&mut self, api_key: String) {
        let api_key = api_key.trim().to_string();
        self.weather.api_key = if api_key.is_empty() { None } else { Some(api_key) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg = Config::from_toml("[weather]\napi_key = \"ABC\"\n").unwrap();

        assert_eq!(cfg.weather.api_key.as_deref(), Some("ABC"));
        assert_eq!(cfg.weather.base_url, weatherbit::DEFAULT_BASE_URL);
        assert_eq!(cfg.weather.timeout_secs, 10);
        assert_eq!(cfg.model, ModelConfig::default());
        assert_eq!(cfg.memory.max_turns, 10);
    }

    #[test]
    fn empty_file_is_default_config() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn environment_key_wins_over_file() {
        let mut cfg = Config::default();
        cfg.set_weather_api_key("FILE_KEY".into());

        assert_eq!(cfg.weather_api_key_with(Some("ENV_KEY".into())).as_deref(), Some("ENV_KEY"));
        assert_eq!(cfg.weather_api_key_with(None).as_deref(), Some("FILE_KEY"));
    }

    #[test]
    fn blank_keys_count_as_missing() {
        let mut cfg = Config::default();
        cfg.set_weather_api_key("   ".into());

        assert_eq!(cfg.weather.api_key, None);
        assert_eq!(cfg.weather_api_key_with(Some(" ".into())), None);
    }

    #[test]
    fn empty_environment_key_does_not_hide_stored_key() {
        let mut cfg = Config::default();
        cfg.set_weather_api_key("FILE_KEY".into());

        assert_eq!(cfg.weather_api_key_with(Some("".into())).as_deref(), Some("FILE_KEY"));
        assert_eq!(cfg.weather_api_key_with(Some("  \n".into())).as_deref(), Some("FILE_KEY"));
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let cfg = Config::from_toml("[weather]\ntimeout_secs = 0\n").unwrap();
        assert_eq!(cfg.weather.timeout(), weatherbit::DEFAULT_TIMEOUT);

        let cfg = Config::from_toml("[weather]\ntimeout_secs = 3\n").unwrap();
        assert_eq!(cfg.weather.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn round_trips_through_toml() {
        let mut cfg = Config::default();
        cfg.set_weather_api_key("KEY".into());
        cfg.model.name = "llama3.1".into();
        cfg.memory.max_turns = 4;

        let text = toml::to_string_pretty(&cfg).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), cfg);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(Config::from_toml("[weather\napi_key = 1").is_err());
    }
}
