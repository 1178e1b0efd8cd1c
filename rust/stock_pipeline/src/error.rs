// src/error.rs

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: &'static str },
    #[error("Response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Table error: {0}")]
    Table(#[from] PolarsError),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} is not set")]
    MissingVar(&'static str),
    #[error("Environment variable {0} must not be empty")]
    EmptyVar(&'static str),
    #[error("Invalid stock symbol '{symbol}': {reason}")]
    InvalidSymbol { symbol: String, reason: String },
    #[error(transparent)]
    InvalidDataType(#[from] stock_cleaning::ParseDataTypeError),
    #[error("No {0} given")]
    Empty(&'static str),
}
