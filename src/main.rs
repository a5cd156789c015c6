//! lake-etl CLI
//!
//! Command-line interface for the CSV to Parquet pipeline

use clap::Parser;
use lake_etl::cli::{Cli, Runner};
use lake_etl::config::Settings;
use tracing::Level;

#[tokio::main]
async fn main() {
    // Environment variables from .env feed the CLI defaults
    let dotenv = Settings::load_dotenv();
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
    if let Some(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        eprintln!("Error [{}]: {e}", e.stage());
        std::process::exit(1);
    }
}
