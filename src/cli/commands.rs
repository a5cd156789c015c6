//! CLI commands and argument parsing

use crate::config::{
    Backend, DEFAULT_CRAWLER_NAME, DEFAULT_DATABASE, DEFAULT_LAKE_ROOT, DEFAULT_PROCESSED_BUCKET,
    DEFAULT_RAW_BUCKET, DEFAULT_RESULTS_LOCATION,
};
use crate::output::{ExportFormat, ParquetCodec, WriteMode};
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

/// CSV to Parquet data lake ETL
#[derive(Parser, Debug)]
#[command(name = "lake-etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Service backend
    #[arg(long, global = true, env = "LAKE_ETL_BACKEND", default_value = "aws")]
    pub backend: Backend,

    /// AWS region (defaults to the SDK provider chain)
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Root directory of the local backend
    #[arg(long, global = true, env = "LAKE_ETL_ROOT", default_value = DEFAULT_LAKE_ROOT)]
    pub lake_root: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a CSV file, land it raw and as partitioned Parquet, then crawl
    Run(RunArgs),

    /// Run a SQL query against the catalogued tables
    Query(QueryArgs),
}

/// Arguments of `run`
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Source CSV file
    #[arg(long)]
    pub csv_file: PathBuf,

    /// Bucket (or location) for the raw copy
    #[arg(long, env = "RAW_BUCKET", default_value = DEFAULT_RAW_BUCKET)]
    pub raw_bucket: String,

    /// Bucket (or location) for the Parquet dataset
    #[arg(long, env = "PROCESSED_BUCKET", default_value = DEFAULT_PROCESSED_BUCKET)]
    pub processed_bucket: String,

    /// Crawler started after the upload
    #[arg(long, env = "GLUE_CRAWLER_NAME", default_value = DEFAULT_CRAWLER_NAME)]
    pub crawler_name: String,

    /// Catalog database, used by `--query`
    #[arg(long, env = "GLUE_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Query results location, used by `--query`
    #[arg(long, env = "ATHENA_RESULTS_BUCKET", default_value = DEFAULT_RESULTS_LOCATION)]
    pub results_location: String,

    /// Partition date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub date: Option<String>,

    /// Transformer configuration (YAML)
    #[arg(short, long)]
    pub transform_config: Option<PathBuf>,

    /// What to do with files already in the target partition
    #[arg(long, default_value = "append")]
    pub write_mode: WriteMode,

    /// CSV field delimiter
    #[arg(long, default_value = ",")]
    pub delimiter: char,

    /// Seconds between crawler status checks
    #[arg(long, default_value = "30")]
    pub crawler_poll_secs: u64,

    /// Seconds before the crawler wait gives up
    #[arg(long, default_value = "600")]
    pub crawler_timeout_secs: u64,

    /// Parquet compression codec
    #[arg(long, default_value = "snappy")]
    pub compression: ParquetCodec,

    /// SQL to run once the crawl has finished
    #[arg(short, long)]
    pub query: Option<String>,
}

/// Arguments of `query`
#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["query", "query_file", "query_id"])
))]
pub struct QueryArgs {
    /// SQL text
    #[arg(short, long)]
    pub query: Option<String>,

    /// File holding the SQL text
    #[arg(long)]
    pub query_file: Option<PathBuf>,

    /// Resume waiting on an already submitted query
    #[arg(long)]
    pub query_id: Option<String>,

    /// Catalog database
    #[arg(long, env = "GLUE_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Query results location
    #[arg(long, env = "ATHENA_RESULTS_BUCKET", default_value = DEFAULT_RESULTS_LOCATION)]
    pub results_location: String,

    /// Write the full result to this file
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Format of `--output-file`
    #[arg(short, long, default_value = "csv")]
    pub format: ExportFormat,

    /// Submit and print the query id without waiting
    #[arg(long = "async")]
    pub no_wait: bool,

    /// Seconds between status checks
    #[arg(long, default_value = "1")]
    pub poll_secs: u64,

    /// Seconds before the wait gives up
    #[arg(long, default_value = "100")]
    pub timeout_secs: u64,
}
