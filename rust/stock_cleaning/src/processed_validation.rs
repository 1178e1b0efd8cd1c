// src/processed_validation.rs

use polars::prelude::{DataFrame, DataType as PolarsType};

use crate::catalog::{Column, ColumnKind, DataType, Schema, SchemaCatalog};
use crate::models::ValidationVerdict;

/// Check a normalized table against the canonical schema of `data_type`.
///
/// All missing columns are reported together; after that the first column
/// with the wrong type (or a null date) fails the table. Extra columns are
/// tolerated.
pub fn validate_processed(
    catalog: &SchemaCatalog,
    table: &DataFrame,
    data_type: &str,
) -> ValidationVerdict {
    match data_type.parse::<DataType>() {
        Ok(data_type) => validate_processed_table(catalog, table, data_type),
        Err(e) => ValidationVerdict::fail(e.to_string()),
    }
}

pub fn validate_processed_table(
    catalog: &SchemaCatalog,
    table: &DataFrame,
    data_type: DataType,
) -> ValidationVerdict {
    let schema = catalog.schema(data_type);
    check_columns_present(schema, table)
        .and_then(|_| schema.columns().try_for_each(|column| check_column(table, column)))
        .into()
}

fn check_columns_present(schema: &Schema, table: &DataFrame) -> Result<(), String> {
    let missing: Vec<&str> = schema
        .columns()
        .map(|column| column.name)
        .filter(|name| table.column(name).is_err())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("Missing required columns: {:?}", missing))
    }
}

fn check_column(table: &DataFrame, column: Column) -> Result<(), String> {
    let series = table
        .column(column.name)
        .map_err(|e| format!("Column '{}' could not be read: {}", column.name, e))?;
    let dtype = series.dtype();

    match column.kind {
        ColumnKind::Date => {
            if dtype != &PolarsType::Date {
                return Err(format!(
                    "Column '{}' must hold dates, instead got {}",
                    column.name, dtype
                ));
            }
            if series.null_count() > 0 {
                return Err(format!(
                    "Column '{}' contains {} missing dates",
                    column.name,
                    series.null_count()
                ));
            }
        }
        ColumnKind::Numeric => {
            if !dtype.is_numeric() {
                return Err(format!(
                    "Column '{}' must be numeric, instead got {}",
                    column.name, dtype
                ));
            }
        }
        ColumnKind::Text => {
            if dtype != &PolarsType::String {
                return Err(format!(
                    "Column '{}' must hold text, instead got {}",
                    column.name, dtype
                ));
            }
        }
    }
    Ok(())
}
