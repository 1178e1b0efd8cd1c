// src/lib.rs

pub mod catalog;
pub mod cleaners;
pub mod error;
pub mod models;
pub mod numeric;
pub mod pipeline;
pub mod processed_validation;
pub mod raw_validation;

pub use catalog::{DataType, Schema, SchemaCatalog};
pub use cleaners::normalize;
pub use error::{CleaningError, ParseDataTypeError};
pub use models::ValidationVerdict;
pub use pipeline::{process_unit, Stage, UnitOutcome};
pub use processed_validation::{validate_processed, validate_processed_table};
pub use raw_validation::{validate_raw, validate_raw_record};
