//! Execution engine module
//!
//! Linear pipeline orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Pipeline` - Runs ingest, raw upload, transform, encoded upload and crawl
//! - `PipelineConfig` - Configuration for one run
//! - `PipelineReport` - Counters and object paths of a finished run

mod types;

pub use types::{PipelineConfig, PipelineReport};

use crate::catalog::{CatalogService, CatalogTrigger};
use crate::error::Result;
use crate::ingest::CsvIngestor;
use crate::output::{dataset_name, processed_prefix, raw_prefix, CloudDestination, Uploader};
use crate::transform::{Transformer, PARTITION_COLUMNS};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// One ETL pipeline: source file to queryable, catalogued Parquet
pub struct Pipeline {
    config: PipelineConfig,
    raw: CloudDestination,
    processed: CloudDestination,
    catalog: CatalogTrigger,
}

impl Pipeline {
    /// Create a pipeline over two storage locations and a catalog service
    pub fn new(
        config: PipelineConfig,
        raw: CloudDestination,
        processed: CloudDestination,
        catalog: Arc<dyn CatalogService>,
    ) -> Self {
        let trigger = CatalogTrigger::new(catalog, config.crawler_poll);
        Self {
            config,
            raw,
            processed,
            catalog: trigger,
        }
    }

    /// Run every stage in order; the first error aborts the run
    pub async fn run(&self, csv_path: &Path) -> Result<PipelineReport> {
        let start = Instant::now();
        let key = self.config.partition_key;
        let dataset = dataset_name(csv_path)?;
        info!("Starting ETL pipeline for {dataset} (partition {})", key.date_path());

        let set = CsvIngestor::new()
            .with_delimiter(self.config.delimiter)
            .read(csv_path)?;
        let rows_read = set.len();

        let uploader = Uploader::new()
            .with_mode(self.config.write_mode)
            .with_parquet_config(self.config.parquet);

        // Land the raw file before transforming so rejected batches are archived
        let raw_location = self.raw.child(&raw_prefix(csv_path, &key)?);
        let raw_object = uploader.upload_raw(csv_path, &raw_location).await?;

        let transformer = Transformer::new(self.config.transform.clone(), key);
        let (transformed, transform) = transformer.apply_with_stats(set)?;

        let processed_location = self.processed.child(&processed_prefix(csv_path)?);
        let upload = uploader
            .upload_encoded(&transformed, &processed_location, &PARTITION_COLUMNS)
            .await?;

        let catalog_state = self.catalog.run(&self.config.crawler_name).await?;

        let elapsed = start.elapsed();
        info!("ETL pipeline finished in {:.1}s", elapsed.as_secs_f64());

        Ok(PipelineReport {
            dataset,
            rows_read,
            transform,
            raw_object,
            upload,
            catalog_state,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests;
