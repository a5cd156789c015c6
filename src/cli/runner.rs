//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, QueryArgs, RunArgs};
use crate::config::Settings;
use crate::engine::{Pipeline, PipelineConfig, PipelineReport};
use crate::error::{Error, Result, ResultExt};
use crate::output::{export_record_set, ParquetWriterConfig};
use crate::query::{query_poll_default, QueryRunner};
use crate::transform::{PartitionKey, TransformConfig};
use crate::types::{PollConfig, RecordSet};
use serde_json::json;
use std::fs;
use tracing::info;

/// Rows printed from a query result
const PREVIEW_ROWS: usize = 5;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Settings from the global flags, defaults elsewhere
    pub fn settings(&self) -> Settings {
        Settings {
            backend: self.cli.backend,
            region: self.cli.region.clone(),
            lake_root: self.cli.lake_root.clone(),
            ..Settings::default()
        }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run(args) => self.run_pipeline(args).await,
            Commands::Query(args) => self.query(args).await,
        }
    }

    async fn run_pipeline(&self, args: &RunArgs) -> Result<()> {
        let settings = Settings {
            raw_bucket: args.raw_bucket.clone(),
            processed_bucket: args.processed_bucket.clone(),
            crawler_name: args.crawler_name.clone(),
            database: args.database.clone(),
            results_location: args.results_location.clone(),
            ..self.settings()
        };

        let key = match &args.date {
            Some(date) => PartitionKey::parse(date)?,
            None => PartitionKey::today(),
        };
        let transform = match &args.transform_config {
            Some(path) => TransformConfig::from_file(path)?,
            None => TransformConfig::default(),
        };
        let delimiter = u8::try_from(args.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| Error::invalid_value("delimiter", "must be a single ASCII character"))?;

        let config = PipelineConfig::new(&settings.crawler_name, key)
            .with_transform(transform)
            .with_write_mode(args.write_mode)
            .with_delimiter(delimiter)
            .with_crawler_poll(PollConfig::from_secs(
                args.crawler_poll_secs,
                args.crawler_timeout_secs,
            ))
            .with_parquet(ParquetWriterConfig::new().with_codec(args.compression));

        let pipeline = Pipeline::new(
            config,
            settings.raw_destination()?,
            settings.processed_destination()?,
            settings.catalog_service().await,
        );
        let report = pipeline.run(&args.csv_file).await?;
        print_report(&report)?;

        if let Some(sql) = &args.query {
            let runner = QueryRunner::new(settings.query_service().await, query_poll_default());
            let set = runner
                .run_query(sql, &settings.database, &settings.query_results_location())
                .await?;
            print_preview(&set)?;
        }

        Ok(())
    }

    async fn query(&self, args: &QueryArgs) -> Result<()> {
        let settings = Settings {
            database: args.database.clone(),
            results_location: args.results_location.clone(),
            ..self.settings()
        };
        let runner = QueryRunner::new(
            settings.query_service().await,
            PollConfig::from_secs(args.poll_secs, args.timeout_secs),
        );

        let set = if let Some(query_id) = &args.query_id {
            runner.wait(query_id).await?;
            runner.fetch(query_id).await?
        } else {
            let sql = match (&args.query, &args.query_file) {
                (Some(sql), _) => sql.clone(),
                (None, Some(path)) => fs::read_to_string(path)
                    .with_context(|| format!("Failed to read query file {}", path.display()))?,
                (None, None) => return Err(Error::config("no query given")),
            };
            let results_location = settings.query_results_location();

            if args.no_wait {
                let query_id = runner
                    .submit(&sql, &settings.database, &results_location)
                    .await?;
                println!("{}", json!({ "query_id": query_id }));
                return Ok(());
            }
            runner
                .run_query(&sql, &settings.database, &results_location)
                .await?
        };

        info!("Query returned {} rows", set.len());
        print_preview(&set)?;

        if let Some(path) = &args.output_file {
            let rows = export_record_set(&set, path, args.format)?;
            info!("Wrote {rows} rows to {}", path.display());
        }
        Ok(())
    }
}

fn print_report(report: &PipelineReport) -> Result<()> {
    let summary = json!({
        "dataset": report.dataset,
        "rows_read": report.rows_read,
        "duplicates_removed": report.transform.duplicates_removed,
        "rows_dropped": report.transform.rows_dropped,
        "rows_written": report.upload.rows,
        "raw_object": report.raw_object,
        "partitions": report.upload.partitions,
        "files": report.upload.files,
        "files_replaced": report.upload.files_replaced,
        "catalog_state": report.catalog_state.to_string(),
        "elapsed_secs": report.elapsed.as_secs_f64(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn print_preview(set: &RecordSet) -> Result<()> {
    for record in set.head(PREVIEW_ROWS).to_json_records() {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}
