// src/models.rs

use serde::{Deserialize, Serialize};
use stock_cleaning::DataType;
use validator::Validate;

use crate::error::ConfigError;

// A ticker as requested on the command line or in SYMBOLS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SymbolRequest {
    #[validate(length(min = 1, max = 5))]
    pub ticker: String,
}

impl SymbolRequest {
    /// Upper-cases and checks a single ticker.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let request = SymbolRequest {
            ticker: raw.trim().to_uppercase(),
        };
        if let Err(errors) = request.validate() {
            return Err(ConfigError::InvalidSymbol {
                symbol: request.ticker,
                reason: errors.to_string(),
            });
        }
        if !request.ticker.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidSymbol {
                symbol: request.ticker,
                reason: "only letters are allowed".to_string(),
            });
        }
        Ok(request)
    }
}

/// Comma separated tickers, e.g. "aapl, MSFT". Duplicates are dropped, order is kept.
pub fn parse_symbols(raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut symbols: Vec<String> = Vec::new();
    for piece in raw.split(',').filter(|piece| !piece.trim().is_empty()) {
        let ticker = SymbolRequest::parse(piece)?.ticker;
        if !symbols.contains(&ticker) {
            symbols.push(ticker);
        }
    }
    if symbols.is_empty() {
        return Err(ConfigError::Empty("stock symbols"));
    }
    Ok(symbols)
}

/// Comma separated data type tags, case-insensitive.
pub fn parse_data_types(raw: &str) -> Result<Vec<DataType>, ConfigError> {
    let mut data_types: Vec<DataType> = Vec::new();
    for piece in raw.split(',').map(str::trim).filter(|piece| !piece.is_empty()) {
        let data_type = piece.to_lowercase().parse::<DataType>()?;
        if !data_types.contains(&data_type) {
            data_types.push(data_type);
        }
    }
    if data_types.is_empty() {
        return Err(ConfigError::Empty("data types"));
    }
    Ok(data_types)
}
