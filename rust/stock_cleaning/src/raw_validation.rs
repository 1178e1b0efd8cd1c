// src/raw_validation.rs

use serde_json::{Map, Value};

use crate::catalog::{
    ColumnKind, DataType, Schema, SchemaCatalog, ValueShape, DAILY_FIELD_PATTERN, DATE_PATTERN,
    IDENTIFIER_PATTERN, NUMERIC_PATTERN,
};
use crate::models::ValidationVerdict;
use crate::numeric::NumericCell;

/// Check a raw API payload against the catalog entry for `data_type`.
///
/// Never panics and never returns `Err`: every shape problem becomes an error
/// verdict whose message names the offending key, date or value. The first
/// failing check wins.
pub fn validate_raw(catalog: &SchemaCatalog, record: &Value, data_type: &str) -> ValidationVerdict {
    let result = check_envelope(record).and_then(|object| {
        let data_type = data_type.parse::<DataType>().map_err(|e| e.to_string())?;
        check_record(object, catalog.schema(data_type))
    });
    result.into()
}

/// Same as [`validate_raw`] for callers that already hold a parsed tag.
pub fn validate_raw_record(
    catalog: &SchemaCatalog,
    record: &Value,
    data_type: DataType,
) -> ValidationVerdict {
    check_envelope(record)
        .and_then(|object| check_record(object, catalog.schema(data_type)))
        .into()
}

// Checks shared by every data type: an object, not empty, not a throttling notice
fn check_envelope(record: &Value) -> Result<&Map<String, Value>, String> {
    let object = match record {
        Value::Object(object) => object,
        other => {
            return Err(format!(
                "Raw payload is not a JSON object, instead: {}",
                json_kind(other)
            ))
        }
    };
    if object.is_empty() {
        return Err("Raw payload cannot be empty".to_string());
    }
    check_sentinel(object)?;
    Ok(object)
}

// The API answers with a single-key object instead of data when throttled or refused
fn check_sentinel(object: &Map<String, Value>) -> Result<(), String> {
    if object.len() != 1 {
        return Ok(());
    }
    match object.iter().next() {
        Some((key, value)) if key == "Information" => Err(format!(
            "API rate limit reached (free plan limit exhausted): {}",
            render(value)
        )),
        Some((key, value)) if key == "Note" => Err(format!(
            "API rate limit reached (call frequency exceeded): {}",
            render(value)
        )),
        Some((key, value)) if key == "Error Message" => {
            Err(format!("API returned an error: {}", render(value)))
        }
        _ => Ok(()),
    }
}

fn check_record(object: &Map<String, Value>, schema: &Schema) -> Result<(), String> {
    match schema.data_type {
        DataType::Daily => check_daily(object, schema),
        DataType::Info => check_info(object, schema),
        DataType::Income | DataType::Balance | DataType::Cash => check_financial(object, schema),
    }
}

fn check_daily(object: &Map<String, Value>, schema: &Schema) -> Result<(), String> {
    let series = extract(object, schema)?;
    let series = series.as_object().ok_or_else(|| {
        format!(
            "Expected an object under '{}', instead got {}",
            extraction_key(schema),
            json_kind(series)
        )
    })?;

    for (date, entry) in series {
        if !DATE_PATTERN.is_match(date) {
            return Err(format!("Invalid date format: {}", date));
        }
        let entry = entry.as_object().ok_or_else(|| {
            format!(
                "Expected an object for date {}, instead got {}",
                date,
                json_kind(entry)
            )
        })?;
        for (field, value) in entry {
            if !DAILY_FIELD_PATTERN.is_match(field) {
                return Err(format!(
                    "Invalid key format: '{}' on {} (should look like '1. open')",
                    field, date
                ));
            }
            if !is_numeric(value) {
                return Err(format!(
                    "Invalid value format: '{}' for key '{}' on {} (should be numeric)",
                    render(value),
                    field,
                    date
                ));
            }
        }
        let missing = missing_fields(entry, schema.required_fields);
        if !missing.is_empty() {
            return Err(format!("The following columns are missing on {}: {:?}", date, missing));
        }
    }
    Ok(())
}

fn check_financial(object: &Map<String, Value>, schema: &Schema) -> Result<(), String> {
    let key = extraction_key(schema);
    let reports = extract(object, schema)?;
    let reports = reports.as_array().ok_or_else(|| {
        format!(
            "Expected an array under '{}', instead got {}",
            key,
            json_kind(reports)
        )
    })?;

    for (position, report) in reports.iter().enumerate() {
        let report = report.as_object().ok_or_else(|| {
            format!(
                "Expected an object in '{}' at position {}, instead got {}",
                key,
                position,
                json_kind(report)
            )
        })?;
        for (field, value) in report {
            if !IDENTIFIER_PATTERN.is_match(field) {
                return Err(format!("Invalid key format: {}", field));
            }
            match value {
                Value::String(text) if ValueShape::classify(text).is_some() => {}
                Value::String(text) => {
                    return Err(format!("Invalid value format for key \"{}\": {}", field, text))
                }
                Value::Number(_) => {}
                other => {
                    return Err(format!(
                        "Expected a string or number as the value corresponding to key {}, instead got {}",
                        field,
                        json_kind(other)
                    ))
                }
            }
        }
        let missing = missing_fields(report, schema.required_fields);
        if !missing.is_empty() {
            let fiscal_date = report
                .get("fiscalDateEnding")
                .and_then(Value::as_str)
                .unwrap_or("unknown date");
            return Err(format!(
                "The following columns are missing in the {} report ending {}: {:?}",
                schema.data_type, fiscal_date, missing
            ));
        }
    }
    Ok(())
}

// Presence and scalar checks only; free-text fields like Name or Sector are legitimate values
fn check_info(object: &Map<String, Value>, schema: &Schema) -> Result<(), String> {
    for field in schema.required_fields {
        if !object.contains_key(*field) {
            return Err(format!("Missing required key: {}", field));
        }
    }

    for field in schema.required_fields {
        let value = &object[*field];
        if !matches!(value, Value::String(_) | Value::Number(_)) {
            return Err(format!(
                "Expected a string value for key {}, instead got {}",
                field,
                json_kind(value)
            ));
        }
        let is_numeric_column = schema
            .canonical_name(field)
            .and_then(|canonical| schema.retained.iter().find(|column| column.name == canonical))
            .map_or(false, |column| column.kind == ColumnKind::Numeric);
        if is_numeric_column && NumericCell::from_json(value).is_invalid() {
            return Err(format!(
                "Invalid value format for key \"{}\": {} (should be numeric or None)",
                field,
                render(value)
            ));
        }
    }
    Ok(())
}

fn extract<'a>(object: &'a Map<String, Value>, schema: &Schema) -> Result<&'a Value, String> {
    let key = extraction_key(schema);
    object
        .get(key)
        .ok_or_else(|| format!("Missing '{}' key.", key))
}

fn extraction_key(schema: &Schema) -> &'static str {
    schema.extraction_key.unwrap_or("")
}

fn missing_fields(record: &Map<String, Value>, required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|field| !record.contains_key(*field))
        .collect()
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::String(text) => NUMERIC_PATTERN.is_match(text),
        Value::Number(_) => true,
        _ => false,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::new()
    }

    fn daily_payload() -> Value {
        json!({
            "Meta Data": {
                "1. Information": "Daily Prices (open, high, low, close) and Volumes",
                "2. Symbol": "AMZN"
            },
            "Time Series (Daily)": {
                "2025-03-24": {
                    "1. open": "200.0000",
                    "2. high": "203.6400",
                    "3. low": "199.9500",
                    "4. close": "203.2600",
                    "5. volume": "41625365"
                }
            }
        })
    }

    fn overview_payload() -> Value {
        json!({
            "Symbol": "IBM",
            "Name": "International Business Machines",
            "Exchange": "NYSE",
            "Currency": "USD",
            "Country": "USA",
            "Sector": "TECHNOLOGY",
            "SharesOutstanding": "921148000"
        })
    }

    #[test]
    fn test_valid_daily_passes() {
        let verdict = validate_raw(&catalog(), &daily_payload(), "daily");
        assert!(verdict.is_ok(), "{}", verdict.message);
        assert_eq!(verdict.message, "Validation successful.");
    }

    #[test]
    fn test_non_object_payload() {
        let verdict = validate_raw(&catalog(), &json!(["AAPL"]), "daily");
        assert!(verdict.error);
        assert!(verdict.message.contains("array"));
    }

    #[test]
    fn test_empty_payload() {
        let verdict = validate_raw(&catalog(), &json!({}), "info");
        assert!(verdict.error);
        assert!(verdict.message.contains("empty"));
    }

    #[test]
    fn test_rate_limit_sentinel() {
        let payload = json!({
            "Information": "We have detected your API key as ... standard API rate limit is 25 requests per day."
        });
        for tag in ["daily", "income", "info"] {
            let verdict = validate_raw(&catalog(), &payload, tag);
            assert!(verdict.error);
            assert!(verdict.message.contains("rate limit"), "{}", verdict.message);
        }
    }

    #[test]
    fn test_information_alongside_data_is_not_a_sentinel() {
        let mut payload = overview_payload();
        payload["Information"] = json!("premium endpoint notice");
        assert!(validate_raw(&catalog(), &payload, "info").is_ok());
    }

    #[test]
    fn test_error_message_payload() {
        let payload = json!({"Error Message": "Invalid API call."});
        let verdict = validate_raw(&catalog(), &payload, "balance");
        assert!(verdict.error);
        assert!(verdict.message.contains("Invalid API call."));
    }

    #[test]
    fn test_unknown_data_type() {
        let verdict = validate_raw(&catalog(), &daily_payload(), "eps");
        assert!(verdict.error);
        assert!(verdict.message.contains("daily, income, balance, cash, info"));
    }

    #[test]
    fn test_daily_missing_series_key() {
        let payload = json!({"Meta Data": {"2. Symbol": "IBM"}, "symbol": "IBM"});
        let verdict = validate_raw(&catalog(), &payload, "daily");
        assert!(verdict.error);
        assert!(verdict.message.contains("Time Series (Daily)"));
    }

    #[test]
    fn test_daily_bad_date_key() {
        let mut payload = daily_payload();
        let entry = payload["Time Series (Daily)"]["2025-03-24"].clone();
        payload["Time Series (Daily)"]["24/03/2025"] = entry;
        let verdict = validate_raw(&catalog(), &payload, "daily");
        assert!(verdict.error);
        assert!(verdict.message.contains("24/03/2025"));
    }

    #[test]
    fn test_daily_bad_field_name() {
        let mut payload = daily_payload();
        payload["Time Series (Daily)"]["2025-03-24"]["open"] = json!("1.0");
        let verdict = validate_raw(&catalog(), &payload, "daily");
        assert!(verdict.error);
        assert!(verdict.message.contains("'open'"));
    }

    #[test]
    fn test_daily_non_numeric_value() {
        let mut payload = daily_payload();
        payload["Time Series (Daily)"]["2025-03-24"]["4. close"] = json!("n/a");
        let verdict = validate_raw(&catalog(), &payload, "daily");
        assert!(verdict.error);
        assert!(verdict.message.contains("4. close"));
        assert!(verdict.message.contains("n/a"));
    }

    #[test]
    fn test_daily_missing_fields_are_named() {
        let mut payload = daily_payload();
        payload["Time Series (Daily)"]["2025-03-24"]
            .as_object_mut()
            .unwrap()
            .remove("5. volume");
        let verdict = validate_raw(&catalog(), &payload, "daily");
        assert!(verdict.error);
        assert!(verdict.message.contains("5. volume"));
        assert!(verdict.message.contains("2025-03-24"));
    }

    #[test]
    fn test_financial_report_must_be_object() {
        let payload = json!({"symbol": "IBM", "annualReports": ["2024-12-31"]});
        let verdict = validate_raw(&catalog(), &payload, "cash");
        assert!(verdict.error);
        assert!(verdict.message.contains("position 0"));
    }

    #[test]
    fn test_financial_invalid_value() {
        let payload = json!({
            "annualReports": [{"fiscalDateEnding": "2024-09-30", "retainedEarnings": "InvalidData"}]
        });
        let verdict = validate_raw(&catalog(), &payload, "balance");
        assert!(verdict.error);
        assert_eq!(
            verdict.message,
            "Invalid value format for key \"retainedEarnings\": InvalidData"
        );
    }

    #[test]
    fn test_first_bad_value_in_payload_order_is_reported() {
        let payload = json!({
            "annualReports": [{
                "totalRevenue": "lots",
                "costOfRevenue": "some",
                "fiscalDateEnding": "2024-12-31"
            }]
        });
        let verdict = validate_raw(&catalog(), &payload, "income");
        assert!(verdict.error);
        assert_eq!(verdict.message, "Invalid value format for key \"totalRevenue\": lots");
    }

    #[test]
    fn test_financial_invalid_key() {
        let payload = json!({"annualReports": [{"fiscal_date": "2024-09-30"}]});
        let verdict = validate_raw(&catalog(), &payload, "income");
        assert!(verdict.error);
        assert!(verdict.message.contains("fiscal_date"));
    }

    #[test]
    fn test_financial_nested_value_rejected() {
        let payload = json!({"annualReports": [{"totalRevenue": {"value": "1"}}]});
        let verdict = validate_raw(&catalog(), &payload, "income");
        assert!(verdict.error);
        assert!(verdict.message.contains("totalRevenue"));
    }

    #[test]
    fn test_info_missing_sector() {
        let mut payload = overview_payload();
        payload.as_object_mut().unwrap().remove("Sector");
        let verdict = validate_raw(&catalog(), &payload, "info");
        assert!(verdict.error);
        assert_eq!(verdict.message, "Missing required key: Sector");
    }

    #[test]
    fn test_info_accepts_free_text() {
        let verdict = validate_raw(&catalog(), &overview_payload(), "info");
        assert!(verdict.is_ok(), "{}", verdict.message);
    }

    #[test]
    fn test_info_shares_must_be_numeric() {
        let mut payload = overview_payload();
        payload["SharesOutstanding"] = json!("lots");
        let verdict = validate_raw(&catalog(), &payload, "info");
        assert!(verdict.error);
        assert!(verdict.message.contains("SharesOutstanding"));

        payload["SharesOutstanding"] = json!("None");
        assert!(validate_raw(&catalog(), &payload, "info").is_ok());
    }

    #[test]
    fn test_typed_entry_point_matches_tagged() {
        let payload = daily_payload();
        assert_eq!(
            validate_raw_record(&catalog(), &payload, DataType::Daily),
            validate_raw(&catalog(), &payload, "daily")
        );
    }
}
