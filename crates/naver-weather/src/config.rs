//! Startup configuration, read once from the environment.

use crate::selectors::SelectorTable;
use std::path::PathBuf;
use std::time::Duration;

/// Cache entry lifetime when `CACHE_TTL_SECONDS` is unset.
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 600;

/// Minimum gap between outbound requests when `RATE_LIMIT_INTERVAL` is unset.
pub const DEFAULT_RATE_LIMIT_INTERVAL: f64 = 1.0;

/// HTTP port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8000;

/// Runtime configuration for the weather service and its HTTP transport
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub cache_ttl: Duration,
    pub rate_limit_interval: Duration,
    pub port: u16,
    /// Optional YAML file replacing the built-in selector table.
    pub selectors_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
            rate_limit_interval: Duration::from_secs_f64(DEFAULT_RATE_LIMIT_INTERVAL),
            port: DEFAULT_PORT,
            selectors_path: None,
        }
    }
}

impl Config {
    /// Read `CACHE_TTL_SECONDS`, `RATE_LIMIT_INTERVAL`, `PORT` and
    /// `NAVER_WEATHER_SELECTORS` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("CACHE_TTL_SECONDS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("CACHE_TTL_SECONDS must be an integer, got '{}'", raw))
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid(
                    "CACHE_TTL_SECONDS must be greater than 0".to_string(),
                ));
            }
            config.cache_ttl = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("RATE_LIMIT_INTERVAL") {
            let secs: f64 = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("RATE_LIMIT_INTERVAL must be a number, got '{}'", raw))
            })?;
            config.rate_limit_interval = Duration::try_from_secs_f64(secs).map_err(|_| {
                ConfigError::Invalid(format!(
                    "RATE_LIMIT_INTERVAL must be a non-negative number of seconds, got '{}'",
                    raw
                ))
            })?;
        }

        if let Some(raw) = lookup("PORT") {
            config.port = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("PORT must be a port number, got '{}'", raw))
            })?;
        }

        if let Some(path) = lookup("NAVER_WEATHER_SELECTORS") {
            if !path.trim().is_empty() {
                config.selectors_path = Some(PathBuf::from(path.trim()));
            }
        }

        Ok(config)
    }

    /// Load the configured selector table, or the built-in one.
    pub fn selector_table(&self) -> Result<SelectorTable, ConfigError> {
        match &self.selectors_path {
            Some(path) => {
                log::info!("Loading selector table from {}", path.display());
                SelectorTable::from_file(path)
            }
            None => Ok(SelectorTable::default()),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid value: {0}")]
    Invalid(String),
}
