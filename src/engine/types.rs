//! Engine types
//!
//! Configuration and report for one pipeline run.

use crate::catalog::{crawler_poll_default, JobState};
use crate::output::{ParquetWriterConfig, UploadSummary, WriteMode};
use crate::transform::{PartitionKey, TransformConfig, TransformStats};
use crate::types::PollConfig;
use std::time::Duration;

/// Configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Partition key shared by every row of the run
    pub partition_key: PartitionKey,
    /// Transformer configuration
    pub transform: TransformConfig,
    /// Append or overwrite existing partitions
    pub write_mode: WriteMode,
    /// CSV field delimiter
    pub delimiter: u8,
    /// Catalog job to start after the upload
    pub crawler_name: String,
    /// Crawler polling
    pub crawler_poll: PollConfig,
    /// Parquet encoding options
    pub parquet: ParquetWriterConfig,
}

impl PipelineConfig {
    /// Create a config for a crawler, with workshop defaults for the rest
    pub fn new(crawler_name: impl Into<String>, partition_key: PartitionKey) -> Self {
        Self {
            partition_key,
            transform: TransformConfig::default(),
            write_mode: WriteMode::default(),
            delimiter: b',',
            crawler_name: crawler_name.into(),
            crawler_poll: crawler_poll_default(),
            parquet: ParquetWriterConfig::default(),
        }
    }

    /// Set the transformer configuration
    #[must_use]
    pub fn with_transform(mut self, transform: TransformConfig) -> Self {
        self.transform = transform;
        self
    }

    /// Set the write mode
    #[must_use]
    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Set the CSV delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set crawler polling
    #[must_use]
    pub fn with_crawler_poll(mut self, poll: PollConfig) -> Self {
        self.crawler_poll = poll;
        self
    }

    /// Set Parquet encoding options
    #[must_use]
    pub fn with_parquet(mut self, parquet: ParquetWriterConfig) -> Self {
        self.parquet = parquet;
        self
    }
}

/// What a successful pipeline run did
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Dataset name (source file stem)
    pub dataset: String,
    /// Rows read from the source file
    pub rows_read: usize,
    /// Transformer counters
    pub transform: TransformStats,
    /// URL of the raw copy
    pub raw_object: String,
    /// Encoded upload summary
    pub upload: UploadSummary,
    /// Final crawler state
    pub catalog_state: JobState,
    /// Wall time of the run
    pub elapsed: Duration,
}
