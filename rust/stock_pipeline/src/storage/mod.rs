// src/storage/mod.rs

pub mod database;
pub mod files;

pub use database::Database;
pub use files::FileStore;
