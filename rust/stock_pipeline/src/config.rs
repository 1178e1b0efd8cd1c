// src/config.rs

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use stock_cleaning::DataType;

use crate::error::ConfigError;
use crate::models::{parse_data_types, parse_symbols};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
pub const DEFAULT_SYMBOLS: &str = "AAPL,MSFT,IBM,TSLA";
pub const DEFAULT_DATA_TYPES: &str = "info,daily,cash,income,balance";

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub raw_data_dir: PathBuf,
    pub processed_data_dir: PathBuf,
    pub database_path: PathBuf,
    pub symbols: Vec<String>,
    pub data_types: Vec<DataType>,
    pub request_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("ALPHA_VANTAGE_API_KEY")
            .ok_or(ConfigError::MissingVar("ALPHA_VANTAGE_API_KEY"))?;
        if api_key.trim().is_empty() {
            return Err(ConfigError::EmptyVar("ALPHA_VANTAGE_API_KEY"));
        }
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            api_key,
            base_url: var_or("ALPHA_VANTAGE_URL", DEFAULT_BASE_URL),
            raw_data_dir: PathBuf::from(var_or("RAW_DATA_DIR", "data/raw")),
            processed_data_dir: PathBuf::from(var_or("PROCESSED_DATA_DIR", "data/processed")),
            database_path: PathBuf::from(var_or("DATABASE_PATH", "data/stocks.db")),
            symbols: parse_symbols(&var_or("SYMBOLS", DEFAULT_SYMBOLS))?,
            data_types: parse_data_types(&var_or("DATA_TYPES", DEFAULT_DATA_TYPES))?,
            request_delay_ms: env_var_parse(&lookup, "REQUEST_DELAY_MS", 0),
            request_timeout_secs: env_var_parse(&lookup, "REQUEST_TIMEOUT_SECS", 30),
        })
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// The API key stays out of logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("raw_data_dir", &self.raw_data_dir)
            .field("processed_data_dir", &self.processed_data_dir)
            .field("database_path", &self.database_path)
            .field("symbols", &self.symbols)
            .field("data_types", &self.data_types)
            .field("request_delay_ms", &self.request_delay_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Parse a variable, falling back to the default when unset or malformed.
fn env_var_parse<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
