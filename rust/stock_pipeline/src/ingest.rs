// src/ingest.rs

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use stock_cleaning::{process_unit, CleaningError, DataType, SchemaCatalog, UnitOutcome};
use tracing::{error, info, warn};

use crate::client::DataSource;
use crate::error::StorageError;
use crate::storage::{Database, FileStore};

/// Counters for one ingestion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestStats {
    pub total: usize,
    pub succeeded: usize,
    /// Payloads refused by either validator
    pub rejected: usize,
    /// Fetch, normalizer or storage failures
    pub failed: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl IngestStats {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }

    pub fn log_summary(&self) {
        info!(
            total = self.total,
            succeeded = self.succeeded,
            rejected = self.rejected,
            failed = self.failed,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "ingestion finished"
        );
    }
}

/// Fetches, validates, normalizes and stores every (symbol, data type) unit.
///
/// A failing unit is logged and skipped; it never stops the run.
pub struct Ingestor<S: DataSource> {
    source: S,
    catalog: SchemaCatalog,
    files: Option<FileStore>,
    database: Option<Database>,
    delay: Duration,
}

impl<S: DataSource> Ingestor<S> {
    pub fn new(source: S) -> Self {
        Ingestor {
            source,
            catalog: SchemaCatalog::new(),
            files: None,
            database: None,
            delay: Duration::ZERO,
        }
    }

    pub fn with_files(mut self, files: FileStore) -> Self {
        self.files = Some(files);
        self
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    pub async fn run(&mut self, symbols: &[String], data_types: &[DataType]) -> IngestStats {
        let started = Instant::now();
        let mut stats = IngestStats::default();
        let data_types = ordered(data_types);
        info!(symbols = symbols.len(), data_types = data_types.len(), "starting ingestion");

        for symbol in symbols {
            for &data_type in &data_types {
                if stats.total > 0 && !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                stats.total += 1;
                match self.ingest_unit(symbol, data_type).await {
                    UnitResult::Stored => stats.succeeded += 1,
                    UnitResult::Rejected => stats.rejected += 1,
                    UnitResult::Failed => stats.failed += 1,
                }
            }
        }

        stats.elapsed = started.elapsed();
        stats
    }

    async fn ingest_unit(&mut self, symbol: &str, data_type: DataType) -> UnitResult {
        let payload = match self.source.fetch(symbol, data_type).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(symbol, data_type = %data_type, error = %e, "fetch failed, skipping");
                return UnitResult::Failed;
            }
        };

        let outcome = process_unit(&self.catalog, &payload, data_type);
        let table = match settle(symbol, data_type, outcome) {
            Ok(table) => table,
            Err(result) => return result,
        };

        match self.store(symbol, data_type, &payload, &table) {
            Ok(()) => {
                info!(symbol, data_type = %data_type, rows = table.height(), "stored");
                UnitResult::Stored
            }
            Err(e) => {
                warn!(symbol, data_type = %data_type, error = %e, "storage failed, skipping");
                UnitResult::Failed
            }
        }
    }

    // Only accepted units reach here. Files are written after the database commits.
    fn store(
        &mut self,
        symbol: &str,
        data_type: DataType,
        payload: &Value,
        table: &DataFrame,
    ) -> Result<(), StorageError> {
        if let Some(database) = &mut self.database {
            database.save(symbol, data_type, table)?;
        }
        if let Some(files) = &self.files {
            files.save_raw(symbol, data_type, payload)?;
            files.save_processed(symbol, data_type, table)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitResult {
    Stored,
    Rejected,
    Failed,
}

// Validator verdicts are routine rejections; a normalizer error is a broken contract
fn settle(
    symbol: &str,
    data_type: DataType,
    outcome: Result<UnitOutcome, CleaningError>,
) -> Result<DataFrame, UnitResult> {
    match outcome {
        Ok(UnitOutcome::Accepted(table)) => Ok(table),
        Ok(UnitOutcome::Rejected { stage, message }) => {
            warn!(
                symbol,
                data_type = %data_type,
                %stage,
                reason = %message,
                "validation failed, skipping"
            );
            Err(UnitResult::Rejected)
        }
        Err(e) => {
            error!(
                symbol,
                data_type = %data_type,
                error = %e,
                "normalizer failed on a validated payload"
            );
            Err(UnitResult::Failed)
        }
    }
}

// Company info goes first so dependent rows find their company
fn ordered(data_types: &[DataType]) -> Vec<DataType> {
    let mut ordered: Vec<DataType> = data_types.to_vec();
    ordered.sort_by_key(|data_type| *data_type != DataType::Info);
    ordered
}
