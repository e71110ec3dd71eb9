use crate::core::conversion::DEFAULT_BASE_AMOUNT_EUR;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CityConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

impl Default for CityConfig {
    fn default() -> Self {
        CityConfig {
            name: "Tokyo".to_string(),
            latitude: 35.6762,
            longitude: 139.6503,
            timezone: "Asia/Tokyo".to_string(),
        }
    }
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_exchange_base_url() -> String {
    "https://api.exchangerate-api.com".to_string()
}

fn default_events_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WeatherProviderConfig {
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
}

impl Default for WeatherProviderConfig {
    fn default() -> Self {
        WeatherProviderConfig {
            base_url: default_weather_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeProviderConfig {
    #[serde(default = "default_exchange_base_url")]
    pub base_url: String,
}

impl Default for ExchangeProviderConfig {
    fn default() -> Self {
        ExchangeProviderConfig {
            base_url: default_exchange_base_url(),
        }
    }
}

fn default_events_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_events_max_tokens() -> u32 {
    1000
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EventsProviderConfig {
    #[serde(default = "default_events_base_url")]
    pub base_url: String,
    #[serde(default = "default_events_model")]
    pub model: String,
    #[serde(default = "default_events_max_tokens")]
    pub max_tokens: u32,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for EventsProviderConfig {
    fn default() -> Self {
        EventsProviderConfig {
            base_url: default_events_base_url(),
            model: default_events_model(),
            max_tokens: default_events_max_tokens(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl EventsProviderConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub weather: WeatherProviderConfig,
    #[serde(default)]
    pub exchange: ExchangeProviderConfig,
    #[serde(default)]
    pub events: EventsProviderConfig,
}

/// One week. Longer intervals are treated as configuration mistakes.
const MAX_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

fn default_refresh_interval_secs() -> u64 {
    30 * 60
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_base_amount_eur() -> f64 {
    DEFAULT_BASE_AMOUNT_EUR
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub city: CityConfig,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_base_amount_eur")]
    pub base_amount_eur: f64,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            city: CityConfig::default(),
            refresh_interval_secs: default_refresh_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            base_amount_eur: default_base_amount_eur(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or built-in defaults when absent.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "tripdash", "tripdash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_INTERVAL_SECS).contains(&self.refresh_interval_secs) {
            anyhow::bail!(
                "refresh_interval_secs must be between 1 and {MAX_INTERVAL_SECS}, got {}",
                self.refresh_interval_secs
            );
        }
        if !(1..=MAX_INTERVAL_SECS).contains(&self.request_timeout_secs) {
            anyhow::bail!(
                "request_timeout_secs must be between 1 and {MAX_INTERVAL_SECS}, got {}",
                self.request_timeout_secs
            );
        }
        crate::core::conversion::ConversionState::validate_amount(self.base_amount_eur)
            .context("Invalid base_amount_eur")?;
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
