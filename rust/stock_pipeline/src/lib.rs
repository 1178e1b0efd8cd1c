// src/lib.rs

pub mod client;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod storage;

pub use client::{AlphaVantageClient, DataSource};
pub use config::Config;
pub use error::{ClientError, ConfigError, StorageError};
pub use ingest::{IngestStats, Ingestor};
pub use storage::{Database, FileStore};
