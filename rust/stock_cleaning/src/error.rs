// src/error.rs

use polars::prelude::PolarsError;
use thiserror::Error;

use crate::catalog::DataType;

pub const VALID_DATA_TYPES: &str = "daily, income, balance, cash, info";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown data type '{0}'. Expected one of [{valid}]", valid = VALID_DATA_TYPES)]
pub struct ParseDataTypeError(pub String);

// Raised when the normalizer is handed something the raw validator should have rejected
#[derive(Debug, Error)]
pub enum CleaningError {
    #[error("Missing extraction key '{key}' in {data_type} payload")]
    MissingExtractionKey { data_type: DataType, key: &'static str },
    #[error("Expected {expected} in {data_type} payload at '{location}'")]
    UnexpectedShape {
        data_type: DataType,
        location: String,
        expected: &'static str,
    },
    #[error("Failed to build {data_type} table: {source}")]
    Table {
        data_type: DataType,
        #[source]
        source: PolarsError,
    },
}
