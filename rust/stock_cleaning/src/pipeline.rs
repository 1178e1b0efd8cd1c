// src/pipeline.rs

use polars::prelude::DataFrame;
use serde_json::Value;
use std::fmt;

use crate::catalog::{DataType, SchemaCatalog};
use crate::cleaners::normalize;
use crate::error::CleaningError;
use crate::processed_validation::validate_processed_table;
use crate::raw_validation::validate_raw_record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Raw,
    Processed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Raw => f.write_str("raw"),
            Stage::Processed => f.write_str("processed"),
        }
    }
}

/// Result of running one (symbol, data type) payload through the core.
#[derive(Debug)]
pub enum UnitOutcome {
    Accepted(DataFrame),
    Rejected { stage: Stage, message: String },
}

impl UnitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, UnitOutcome::Accepted(_))
    }
}

/// Raw validation, normalization and processed validation in sequence.
///
/// A table is only handed back when both validators pass. `Err` is reserved
/// for payloads the normalizer cannot read at all, which raw validation
/// should already have caught.
pub fn process_unit(
    catalog: &SchemaCatalog,
    record: &Value,
    data_type: DataType,
) -> Result<UnitOutcome, CleaningError> {
    let verdict = validate_raw_record(catalog, record, data_type);
    if verdict.error {
        return Ok(UnitOutcome::Rejected {
            stage: Stage::Raw,
            message: verdict.message,
        });
    }

    let table = normalize(catalog, record, data_type)?;

    let verdict = validate_processed_table(catalog, &table, data_type);
    if verdict.error {
        return Ok(UnitOutcome::Rejected {
            stage: Stage::Processed,
            message: verdict.message,
        });
    }
    Ok(UnitOutcome::Accepted(table))
}
