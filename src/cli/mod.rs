//! CLI module
//!
//! Command-line interface for the ETL pipeline.
//!
//! # Commands
//!
//! - `run` - Ingest a CSV file, upload raw and Parquet copies, crawl, optionally query
//! - `query` - Run, submit or resume a SQL query and print or export the result

mod commands;
mod runner;

pub use commands::{Cli, Commands, QueryArgs, RunArgs};
pub use runner::Runner;

#[cfg(test)]
mod tests;
