// src/cleaners.rs

use chrono::NaiveDate;
use polars::prelude::{DataFrame, NamedFrom, Series};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::catalog::{ColumnKind, DataType, Derivation, DerivedColumn, Schema, SchemaCatalog};
use crate::error::CleaningError;
use crate::numeric::{date_from_json, parse_date, text_from_json, NumericCell};

/// Turn a raw payload that passed raw validation into a typed table with the
/// canonical column names for `data_type`.
///
/// Numeric text that cannot be parsed becomes null instead of failing; only a
/// payload whose nesting is wrong produces an error.
pub fn normalize(
    catalog: &SchemaCatalog,
    record: &Value,
    data_type: DataType,
) -> Result<DataFrame, CleaningError> {
    let schema = catalog.schema(data_type);
    let table = match data_type {
        DataType::Daily => clean_daily(schema, record)?,
        DataType::Info => clean_info(schema, record)?,
        DataType::Income => clean_income(schema, record)?,
        DataType::Balance => clean_balance(schema, record)?,
        DataType::Cash => clean_cash(schema, record)?,
    };
    debug!(
        data_type = %data_type,
        rows = table.height(),
        columns = table.width(),
        "normalized payload"
    );
    Ok(table)
}

pub fn clean_daily(schema: &Schema, record: &Value) -> Result<DataFrame, CleaningError> {
    let series = extract(schema, record)?;
    let series = series
        .as_object()
        .ok_or_else(|| unexpected(schema, extraction_key(schema), "an object of dates"))?;

    let mut entries = Vec::with_capacity(series.len());
    let mut dropped = Vec::new();
    for (key, entry) in series {
        let entry = entry
            .as_object()
            .ok_or_else(|| unexpected(schema, key, "an object of prices"))?;
        // Keys like 2025-02-30 pass the shape check but name no calendar day
        match parse_date(key) {
            Some(date) => entries.push((date, entry)),
            None => dropped.push(key.as_str()),
        }
    }
    if !dropped.is_empty() {
        warn!(dates = ?dropped, "dropping daily rows with impossible dates");
    }

    let mut table = Table::with_rows(entries.len());
    for column in schema.retained {
        let data = match column.kind {
            // One row per surviving series key
            ColumnKind::Date => {
                ColumnData::Dates(entries.iter().map(|(date, _)| Some(*date)).collect())
            }
            kind => {
                let Some(raw) = schema.raw_name(column.name) else {
                    continue;
                };
                ColumnData::collect(kind, entries.iter().map(|(_, entry)| entry.get(raw)))
            }
        };
        table.push(column.name, data);
    }
    table.into_frame(schema.data_type)
}

pub fn clean_info(schema: &Schema, record: &Value) -> Result<DataFrame, CleaningError> {
    let overview = record
        .as_object()
        .ok_or_else(|| unexpected(schema, "$", "an object"))?;

    let mut table = Table::with_rows(1);
    for column in schema.retained {
        let value = schema.raw_name(column.name).and_then(|raw| overview.get(raw));
        table.push(column.name, ColumnData::collect(column.kind, std::iter::once(value)));
    }
    table.into_frame(schema.data_type)
}

pub fn clean_income(schema: &Schema, record: &Value) -> Result<DataFrame, CleaningError> {
    clean_financial(schema, record)
}

pub fn clean_balance(schema: &Schema, record: &Value) -> Result<DataFrame, CleaningError> {
    clean_financial(schema, record)
}

pub fn clean_cash(schema: &Schema, record: &Value) -> Result<DataFrame, CleaningError> {
    clean_financial(schema, record)
}

// Shared by the annualReports payloads: project, rename, coerce, then derive
fn clean_financial(schema: &Schema, record: &Value) -> Result<DataFrame, CleaningError> {
    let key = extraction_key(schema);
    let reports = extract(schema, record)?
        .as_array()
        .ok_or_else(|| unexpected(schema, key, "an array of reports"))?;

    let mut rows: Vec<&Map<String, Value>> = Vec::with_capacity(reports.len());
    for (position, report) in reports.iter().enumerate() {
        let report = report
            .as_object()
            .ok_or_else(|| unexpected(schema, &format!("{}[{}]", key, position), "an object"))?;
        rows.push(report);
    }

    let mut table = Table::with_rows(rows.len());
    for column in schema.retained {
        let Some(raw) = schema.raw_name(column.name) else {
            continue;
        };
        // Columns absent from every report are dropped, the processed validator reports them
        if !rows.iter().any(|report| report.contains_key(raw)) {
            continue;
        }
        let data = ColumnData::collect(column.kind, rows.iter().map(|report| report.get(raw)));
        table.push(column.name, data);
    }
    table.derive(schema.derived);
    table.into_frame(schema.data_type)
}

fn extract<'a>(schema: &Schema, record: &'a Value) -> Result<&'a Value, CleaningError> {
    let key = extraction_key(schema);
    record
        .get(key)
        .ok_or(CleaningError::MissingExtractionKey {
            data_type: schema.data_type,
            key,
        })
}

fn extraction_key(schema: &Schema) -> &'static str {
    schema.extraction_key.unwrap_or("$")
}

fn unexpected(schema: &Schema, location: &str, expected: &'static str) -> CleaningError {
    CleaningError::UnexpectedShape {
        data_type: schema.data_type,
        location: location.to_string(),
        expected,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ColumnData {
    Dates(Vec<Option<NaiveDate>>),
    Numbers(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    fn collect<'a>(kind: ColumnKind, values: impl Iterator<Item = Option<&'a Value>>) -> Self {
        match kind {
            ColumnKind::Date => {
                ColumnData::Dates(values.map(|v| v.and_then(date_from_json)).collect())
            }
            ColumnKind::Numeric => ColumnData::Numbers(
                values
                    .map(|v| v.map_or(NumericCell::Null, NumericCell::from_json).into_option())
                    .collect(),
            ),
            ColumnKind::Text => {
                ColumnData::Text(values.map(|v| v.and_then(text_from_json)).collect())
            }
        }
    }

    fn into_series(self, name: &str) -> Series {
        match self {
            ColumnData::Dates(values) => Series::new(name, values),
            ColumnData::Numbers(values) => Series::new(name, values),
            ColumnData::Text(values) => Series::new(name, values),
        }
    }
}

// Column-major staging area; derived columns are computed here before polars sees the data
struct Table {
    rows: usize,
    columns: Vec<(&'static str, ColumnData)>,
}

impl Table {
    fn with_rows(rows: usize) -> Self {
        Table {
            rows,
            columns: Vec::new(),
        }
    }

    fn push(&mut self, name: &'static str, data: ColumnData) {
        self.columns.push((name, data));
    }

    fn numbers(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.iter().find_map(|(column, data)| match data {
            ColumnData::Numbers(values) if *column == name => Some(values.as_slice()),
            _ => None,
        })
    }

    // Derived values are null when an input is null or missing
    fn derive(&mut self, derived: &[DerivedColumn]) {
        for column in derived {
            let (left, right) = match column.derivation {
                Derivation::Percentage { numerator, denominator } => (numerator, denominator),
                Derivation::Difference { minuend, subtrahend } => (minuend, subtrahend),
            };
            let values: Vec<Option<f64>> = match (self.numbers(left), self.numbers(right)) {
                (Some(left), Some(right)) => left
                    .iter()
                    .zip(right)
                    .map(|(a, b)| apply(&column.derivation, (*a)?, (*b)?))
                    .collect(),
                _ => vec![None; self.rows],
            };
            self.push(column.name, ColumnData::Numbers(values));
        }
    }

    fn into_frame(self, data_type: DataType) -> Result<DataFrame, CleaningError> {
        let series: Vec<Series> = self
            .columns
            .into_iter()
            .map(|(name, data)| data.into_series(name))
            .collect();
        DataFrame::new(series).map_err(|source| CleaningError::Table { data_type, source })
    }
}

fn apply(derivation: &Derivation, left: f64, right: f64) -> Option<f64> {
    match derivation {
        Derivation::Percentage { .. } if right == 0.0 => None,
        Derivation::Percentage { .. } => Some(left / right * 100.0),
        Derivation::Difference { .. } => Some(left - right),
    }
}
