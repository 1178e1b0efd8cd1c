// src/numeric.rs

use chrono::NaiveDate;
use serde_json::Value;

use crate::catalog::NULL_SENTINEL_PATTERN;

/// Outcome of reading one stringified number from the API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericCell {
    Value(f64),
    /// The API reported the value as missing ("None", empty or JSON null)
    Null,
    /// Something that is neither a number nor a null marker
    Invalid,
}

impl NumericCell {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || NULL_SENTINEL_PATTERN.is_match(trimmed) {
            return NumericCell::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => NumericCell::Value(value),
            _ => NumericCell::Invalid,
        }
    }

    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => NumericCell::Null,
            Value::Number(number) => number
                .as_f64()
                .filter(|value| value.is_finite())
                .map_or(NumericCell::Invalid, NumericCell::Value),
            Value::String(raw) => NumericCell::parse(raw),
            _ => NumericCell::Invalid,
        }
    }

    // Coercion used by the cleaners: anything that is not a number becomes null
    pub fn into_option(self) -> Option<f64> {
        match self {
            NumericCell::Value(value) => Some(value),
            NumericCell::Null | NumericCell::Invalid => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, NumericCell::Invalid)
    }
}

// Convert "YYYY-MM-DD" into a calendar date, None when it does not exist
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

pub fn date_from_json(value: &Value) -> Option<NaiveDate> {
    value.as_str().and_then(parse_date)
}

// Strings are taken as-is, numbers and booleans are rendered, the "None" sentinel is null
pub fn text_from_json(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if NULL_SENTINEL_PATTERN.is_match(text) => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
