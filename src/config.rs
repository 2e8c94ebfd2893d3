use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;

const THROW_ON_NO_LISTENERS: &str = "DISPATCH_THROW_ON_NO_LISTENERS";

/// Errors raised while loading configuration from the environment
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for environment variable {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Options a dispatcher is constructed with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Fail emissions that match no handler at all
    pub throw_on_no_listeners: bool,
}

impl DispatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_throw_on_no_listeners(mut self, enabled: bool) -> Self {
        self.throw_on_no_listeners = enabled;
        self
    }

    /// Reads a JSON config file; missing fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config = serde_json::from_reader(file)?;
        Ok(config)
    }

    /// Loads `.env` if present, then reads the process environment.
    pub fn try_from_env() -> Result<DispatcherConfig, ConfigError> {
        dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the config from any variable source; absent variables keep
    /// their defaults.
    pub fn from_vars<F>(lookup: F) -> Result<DispatcherConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let throw_on_no_listeners = match lookup(THROW_ON_NO_LISTENERS) {
            Some(raw) => parse_flag(THROW_ON_NO_LISTENERS, &raw)?,
            None => false,
        };
        info!("Loaded dispatcher config: throw_on_no_listeners={}", throw_on_no_listeners);

        Ok(DispatcherConfig {
            throw_on_no_listeners,
        })
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}
