// src/storage/database.rs

use chrono::NaiveDate;
use polars::prelude::{DataFrame, DataType as PolarsType};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use std::path::Path;
use stock_cleaning::DataType;
use tracing::debug;

use crate::error::StorageError;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS companies (
        company_id INTEGER PRIMARY KEY AUTOINCREMENT,
        ticker_symbol TEXT NOT NULL UNIQUE,
        name TEXT,
        total_shares INTEGER,
        exchange TEXT,
        currency TEXT,
        country TEXT,
        sector TEXT
    );

    CREATE TABLE IF NOT EXISTS stocks (
        stock_id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL REFERENCES companies(company_id) ON DELETE CASCADE,
        date TEXT NOT NULL,
        open REAL,
        close REAL,
        volume INTEGER,
        UNIQUE (company_id, date)
    );

    CREATE TABLE IF NOT EXISTS income_statements (
        statement_id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL REFERENCES companies(company_id) ON DELETE CASCADE,
        date TEXT NOT NULL,
        total_revenue REAL,
        gross_profit REAL,
        operating_income REAL,
        net_income REAL,
        interest_and_debt_expense REAL,
        ebit REAL,
        gross_margin REAL,
        operating_margin REAL,
        ebit_margin REAL,
        UNIQUE (company_id, date)
    );

    CREATE TABLE IF NOT EXISTS balance_sheets (
        statement_id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL REFERENCES companies(company_id) ON DELETE CASCADE,
        date TEXT NOT NULL,
        total_current_assets REAL,
        total_non_current_assets REAL,
        total_current_liabilities REAL,
        total_non_current_liabilities REAL,
        total_shareholder_equity REAL,
        short_term_debt REAL,
        long_term_debt REAL,
        retained_earnings REAL,
        cash_and_cash_equivalents REAL,
        UNIQUE (company_id, date)
    );

    CREATE TABLE IF NOT EXISTS cash_flows (
        statement_id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL REFERENCES companies(company_id) ON DELETE CASCADE,
        date TEXT NOT NULL,
        operating_cash_flow REAL,
        capital_expenditures REAL,
        cashflow_from_investment REAL,
        cashflow_from_financing REAL,
        dividend_payout REAL,
        debt_repayments REAL,
        free_cashflow REAL,
        UNIQUE (company_id, date)
    );
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    Real,
    Integer,
}

/// Where a dated table lands: (frame column, SQL column, storage class).
struct TableMapping {
    table: &'static str,
    date_column: &'static str,
    columns: &'static [(&'static str, &'static str, Storage)],
}

const STOCKS: TableMapping = TableMapping {
    table: "stocks",
    date_column: "Date",
    columns: &[
        ("Open", "open", Storage::Real),
        ("Close", "close", Storage::Real),
        ("Volume", "volume", Storage::Integer),
    ],
};

const INCOME_STATEMENTS: TableMapping = TableMapping {
    table: "income_statements",
    date_column: "fiscal_date_ending",
    columns: &[
        ("total_revenue", "total_revenue", Storage::Real),
        ("gross_profit", "gross_profit", Storage::Real),
        ("operating_income", "operating_income", Storage::Real),
        ("net_income", "net_income", Storage::Real),
        ("interest_and_debt_expense", "interest_and_debt_expense", Storage::Real),
        ("ebit", "ebit", Storage::Real),
        ("gross_margin", "gross_margin", Storage::Real),
        ("operating_margin", "operating_margin", Storage::Real),
        ("ebit_margin", "ebit_margin", Storage::Real),
    ],
};

const BALANCE_SHEETS: TableMapping = TableMapping {
    table: "balance_sheets",
    date_column: "fiscal_date_ending",
    columns: &[
        ("total_current_assets", "total_current_assets", Storage::Real),
        ("total_non_current_assets", "total_non_current_assets", Storage::Real),
        ("total_current_liabilities", "total_current_liabilities", Storage::Real),
        ("total_non_current_liabilities", "total_non_current_liabilities", Storage::Real),
        ("total_shareholder_equity", "total_shareholder_equity", Storage::Real),
        ("short_term_debt", "short_term_debt", Storage::Real),
        ("long_term_debt", "long_term_debt", Storage::Real),
        ("retained_earnings", "retained_earnings", Storage::Real),
        ("cash_and_cash_equivalents", "cash_and_cash_equivalents", Storage::Real),
    ],
};

const CASH_FLOWS: TableMapping = TableMapping {
    table: "cash_flows",
    date_column: "fiscal_date_ending",
    columns: &[
        ("operating_cashflow", "operating_cash_flow", Storage::Real),
        ("capital_expenditures", "capital_expenditures", Storage::Real),
        ("cashflow_from_investment", "cashflow_from_investment", Storage::Real),
        ("cashflow_from_financing", "cashflow_from_financing", Storage::Real),
        ("dividend_payout", "dividend_payout", Storage::Real),
        ("debt_repayments", "debt_repayments", Storage::Real),
        ("free_cashflow", "free_cashflow", Storage::Real),
    ],
};

/// SQLite sink for accepted tables. Each save runs in its own transaction.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Database { conn })
    }

    /// Upsert one accepted table for `symbol`, returning the number of rows written.
    pub fn save(
        &mut self,
        symbol: &str,
        data_type: DataType,
        table: &DataFrame,
    ) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        let written = match data_type {
            DataType::Info => upsert_company(&tx, symbol, table)?,
            DataType::Daily => upsert_dated(&tx, symbol, &STOCKS, table)?,
            DataType::Income => upsert_dated(&tx, symbol, &INCOME_STATEMENTS, table)?,
            DataType::Balance => upsert_dated(&tx, symbol, &BALANCE_SHEETS, table)?,
            DataType::Cash => upsert_dated(&tx, symbol, &CASH_FLOWS, table)?,
        };
        tx.commit()?;
        debug!(symbol, data_type = %data_type, rows = written, "saved to database");
        Ok(written)
    }

    pub fn company_id(&self, symbol: &str) -> Result<Option<i64>, StorageError> {
        let id = self
            .conn
            .query_row(
                "SELECT company_id FROM companies WHERE ticker_symbol = ?1",
                params![symbol],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn count_rows(&self, table: &str) -> Result<i64, StorageError> {
        // Only the fixed table names above are ever passed in
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn upsert_company(
    tx: &Transaction,
    symbol: &str,
    table: &DataFrame,
) -> Result<usize, StorageError> {
    let name = text_column(table, "name")?;
    let total_shares = number_column(table, "total_shares")?;
    let exchange = text_column(table, "exchange")?;
    let currency = text_column(table, "currency")?;
    let country = text_column(table, "country")?;
    let sector = text_column(table, "sector")?;

    let mut stmt = tx.prepare_cached(
        "INSERT INTO companies (ticker_symbol, name, total_shares, exchange, currency, country, sector)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(ticker_symbol) DO UPDATE SET
            name = excluded.name,
            total_shares = excluded.total_shares,
            exchange = excluded.exchange,
            currency = excluded.currency,
            country = excluded.country,
            sector = excluded.sector",
    )?;
    let mut written = 0;
    for row in 0..table.height() {
        written += stmt.execute(params![
            symbol,
            name[row],
            total_shares[row].map(|shares| shares.round() as i64),
            exchange[row],
            currency[row],
            country[row],
            sector[row],
        ])?;
    }
    Ok(written)
}

// Placeholder row so dated data can land before the overview does
fn ensure_company(tx: &Transaction, symbol: &str) -> Result<i64, StorageError> {
    tx.execute(
        "INSERT INTO companies (ticker_symbol) VALUES (?1) ON CONFLICT(ticker_symbol) DO NOTHING",
        params![symbol],
    )?;
    let id = tx.query_row(
        "SELECT company_id FROM companies WHERE ticker_symbol = ?1",
        params![symbol],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn upsert_dated(
    tx: &Transaction,
    symbol: &str,
    mapping: &TableMapping,
    table: &DataFrame,
) -> Result<usize, StorageError> {
    let company_id = ensure_company(tx, symbol)?;
    let dates = date_column(table, mapping.date_column)?;
    let columns = mapping
        .columns
        .iter()
        .map(|(frame_column, _, _)| number_column(table, frame_column))
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = tx.prepare_cached(&upsert_sql(mapping))?;
    let mut written = 0;
    for (row, date) in dates.iter().enumerate() {
        // Dates are non-null in accepted tables
        let Some(date) = date else {
            continue;
        };
        let mut values = vec![SqlValue::Integer(company_id), SqlValue::Text(date.to_string())];
        for ((_, _, storage), column) in mapping.columns.iter().zip(&columns) {
            values.push(to_sql_value(column[row], *storage));
        }
        written += stmt.execute(params_from_iter(values))?;
    }
    Ok(written)
}

fn upsert_sql(mapping: &TableMapping) -> String {
    let names: Vec<&str> = mapping.columns.iter().map(|(_, sql, _)| *sql).collect();
    let placeholders: Vec<String> = (3..names.len() + 3).map(|i| format!("?{}", i)).collect();
    let updates: Vec<String> = names
        .iter()
        .map(|name| format!("{name} = excluded.{name}"))
        .collect();
    format!(
        "INSERT INTO {} (company_id, date, {}) VALUES (?1, ?2, {}) ON CONFLICT(company_id, date) DO UPDATE SET {}",
        mapping.table,
        names.join(", "),
        placeholders.join(", "),
        updates.join(", ")
    )
}

fn to_sql_value(value: Option<f64>, storage: Storage) -> SqlValue {
    match (value, storage) {
        (None, _) => SqlValue::Null,
        (Some(value), Storage::Real) => SqlValue::Real(value),
        (Some(value), Storage::Integer) => SqlValue::Integer(value.round() as i64),
    }
}

fn date_column(table: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>, StorageError> {
    Ok(table.column(name)?.date()?.as_date_iter().collect())
}

// Any numeric dtype passes processed validation, so cast before reading
fn number_column(table: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, StorageError> {
    let series = table.column(name)?.cast(&PolarsType::Float64)?;
    let values = series.f64()?.into_iter().collect();
    Ok(values)
}

fn text_column(table: &DataFrame, name: &str) -> Result<Vec<Option<String>>, StorageError> {
    let values = table
        .column(name)?
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}
