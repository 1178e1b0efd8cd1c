// src/storage/files.rs

use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use serde_json::Value;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use stock_cleaning::DataType;
use tracing::debug;

use crate::error::StorageError;

/// Writes raw payloads as JSON and normalized tables as CSV, one file per unit.
#[derive(Debug, Clone)]
pub struct FileStore {
    raw_dir: PathBuf,
    processed_dir: PathBuf,
}

impl FileStore {
    pub fn new(raw_dir: impl Into<PathBuf>, processed_dir: impl Into<PathBuf>) -> Self {
        FileStore {
            raw_dir: raw_dir.into(),
            processed_dir: processed_dir.into(),
        }
    }

    pub fn raw_path(&self, symbol: &str, data_type: DataType) -> PathBuf {
        self.raw_dir.join(format!("{}_{}.json", symbol, data_type))
    }

    pub fn processed_path(&self, symbol: &str, data_type: DataType) -> PathBuf {
        self.processed_dir.join(format!("{}_{}.csv", symbol, data_type))
    }

    pub fn save_raw(
        &self,
        symbol: &str,
        data_type: DataType,
        payload: &Value,
    ) -> Result<PathBuf, StorageError> {
        let path = self.raw_path(symbol, data_type);
        ensure_parent(&path)?;
        fs::write(&path, serde_json::to_string_pretty(payload)?)?;
        debug!(path = %path.display(), "saved raw payload");
        Ok(path)
    }

    pub fn save_processed(
        &self,
        symbol: &str,
        data_type: DataType,
        table: &DataFrame,
    ) -> Result<PathBuf, StorageError> {
        let path = self.processed_path(symbol, data_type);
        ensure_parent(&path)?;
        let mut file = File::create(&path)?;
        // CsvWriter needs a mutable frame; clones share the column buffers
        let mut table = table.clone();
        CsvWriter::new(&mut file).include_header(true).finish(&mut table)?;
        debug!(path = %path.display(), rows = table.height(), "saved processed table");
        Ok(path)
    }
}

fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
