// src/main.rs

use anyhow::Context;
use clap::Parser;
use stock_pipeline::models::{parse_data_types, parse_symbols};
use stock_pipeline::{AlphaVantageClient, Config, Database, FileStore, Ingestor};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stock_pipeline")]
#[command(about = "Fetch, validate and store Alpha Vantage fundamentals", long_about = None)]
#[command(version)]
struct Cli {
    /// Comma separated tickers, overrides SYMBOLS (e.g. "AAPL,MSFT")
    #[arg(long)]
    symbols: Option<String>,

    /// Comma separated data types, overrides DATA_TYPES (daily, income, balance, cash, info)
    #[arg(long)]
    data_types: Option<String>,

    /// Skip the SQLite sink
    #[arg(long)]
    no_database: bool,

    /// Skip writing raw JSON and processed CSV files
    #[arg(long)]
    no_files: bool,

    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = format!("stock_pipeline={0},stock_cleaning={0}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(symbols) = &cli.symbols {
        config.symbols = parse_symbols(symbols)?;
    }
    if let Some(data_types) = &cli.data_types {
        config.data_types = parse_data_types(data_types)?;
    }
    tracing::debug!(?config, "configuration loaded");

    let client = AlphaVantageClient::from_config(&config).context("failed to build HTTP client")?;
    let mut ingestor = Ingestor::new(client).with_delay(config.request_delay());
    if !cli.no_files {
        let files = FileStore::new(&config.raw_data_dir, &config.processed_data_dir);
        ingestor = ingestor.with_files(files);
    }
    if !cli.no_database {
        let path = &config.database_path;
        let database = Database::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        ingestor = ingestor.with_database(database);
    }

    let stats = ingestor.run(&config.symbols, &config.data_types).await;
    stats.log_summary();
    Ok(())
}
