// src/client.rs

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use stock_cleaning::DataType;
use tracing::debug;

use crate::config::Config;
use crate::error::ClientError;

/// Anything that can hand back the raw JSON payload for one (symbol, data type).
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, symbol: &str, data_type: DataType) -> Result<Value, ClientError>;
}

pub struct AlphaVantageClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(AlphaVantageClient {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(&config.base_url, &config.api_key, config.request_timeout())
    }
}

#[async_trait]
impl DataSource for AlphaVantageClient {
    async fn fetch(&self, symbol: &str, data_type: DataType) -> Result<Value, ClientError> {
        let params = build_parameters(symbol, data_type, &self.api_key);
        debug!(
            symbol,
            data_type = %data_type,
            function = function_name(data_type),
            "requesting payload"
        );

        let response = self.http.get(&self.base_url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: status_message(status.as_u16()),
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

pub fn function_name(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Daily => "TIME_SERIES_DAILY",
        DataType::Income => "INCOME_STATEMENT",
        DataType::Balance => "BALANCE_SHEET",
        DataType::Cash => "CASH_FLOW",
        DataType::Info => "OVERVIEW",
    }
}

pub fn build_parameters(
    symbol: &str,
    data_type: DataType,
    api_key: &str,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("function", function_name(data_type).to_string()),
        ("symbol", symbol.to_string()),
        ("apikey", api_key.to_string()),
    ];
    // Daily prices default to the last 100 days otherwise
    if data_type == DataType::Daily {
        params.push(("datatype", "json".to_string()));
        params.push(("outputsize", "full".to_string()));
    }
    params
}

pub fn status_message(status: u16) -> &'static str {
    match status {
        400 => "Bad request. Please check the function and symbol.",
        401 => "Invalid API key. Please check ALPHA_VANTAGE_API_KEY.",
        403 => "Forbidden. Please check the API key and URL.",
        404 => "Resource not found. Please check the function and symbol.",
        429 => "Rate limit exceeded. Please wait for a few seconds before retrying.",
        500 => "Internal server error. Please try again later.",
        502 => "Bad gateway. Please try again later.",
        503 => "Service unavailable. Please try again later.",
        504 => "Gateway timeout. Please try again later.",
        _ => "Unexpected HTTP status.",
    }
}
