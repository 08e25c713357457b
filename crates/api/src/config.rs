//! Application Configuration
//!
//! Layered from an optional TOML file and `HAZARD_*` environment variables,
//! e.g. `HAZARD_SERVER__BIND_ADDR=127.0.0.1:9000` or
//! `HAZARD_ALERTING__SINK_TIMEOUT_MS=500`.

use crate::rate_limit::RateLimitConfig;
use alerting::AlertConfig;
use config::{Config, Environment, File, FileFormat};
use monitor::MonitorConfig;
use risk_scorer::ThresholdTable;
use serde::{Deserialize, Serialize};
use storage::{DEFAULT_READING_RETENTION, DEFAULT_SCENARIO_RETENTION};
use thiserror::Error;

/// Configuration file read when `HAZARD_MONITOR_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "hazard-monitor.toml";
/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "HAZARD_MONITOR_CONFIG";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (default: 0.0.0.0:8080)
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Log output settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Retention and persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Readings kept for the live view and export (default: 500)
    pub reading_retention: usize,
    /// Saved scenarios kept (default: 10)
    pub scenario_retention: usize,
    /// SQLite URL of the incident log; in-memory log when unset
    pub incident_db: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            reading_retention: DEFAULT_READING_RETENTION,
            scenario_retention: DEFAULT_SCENARIO_RETENTION,
            incident_db: None,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub monitor: MonitorConfig,
    pub alerting: AlertConfig,
    pub storage: StorageConfig,
    /// Per-metric overrides on top of the built-in table
    #[serde(default = "ThresholdTable::empty")]
    pub thresholds: ThresholdTable,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load from the file named by `HAZARD_MONITOR_CONFIG` (or the default file) plus the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// Load from `path` (optional) plus the environment
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("HAZARD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::finish(settings)
    }

    /// Parse a TOML document, without environment overrides
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        Self::finish(settings)
    }

    fn finish(settings: Config) -> Result<Self, ConfigError> {
        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Built-in thresholds with the configured overrides applied
    pub fn threshold_table(&self) -> ThresholdTable {
        ThresholdTable::default().merged(&self.thresholds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.sample_interval_ms == 0 || self.monitor.classify_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "monitor intervals must be positive".to_string(),
            ));
        }
        if self.storage.reading_retention == 0 || self.storage.scenario_retention == 0 {
            return Err(ConfigError::Invalid(
                "storage retention must be positive".to_string(),
            ));
        }
        if self.rate_limit.per_second == 0 || self.rate_limit.burst_size == 0 {
            return Err(ConfigError::Invalid(
                "rate limit period and burst must be positive".to_string(),
            ));
        }
        if self.monitor.enabled && self.monitor.zones.is_empty() {
            return Err(ConfigError::Invalid(
                "monitor needs at least one zone".to_string(),
            ));
        }
        Ok(())
    }
}
