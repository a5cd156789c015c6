//! Raw and encoded uploads
//!
//! The raw file is copied byte-for-byte; the transformed record set is
//! encoded as Parquet and split into Hive-style `col=value` partitions.

use super::cloud::CloudDestination;
use super::schema::{build_batch, infer_schema};
use super::writer::{encode_parquet, ParquetWriterConfig};
use crate::error::{Error, Result};
use crate::transform::PartitionKey;
use crate::types::{RecordSet, Row, Scalar};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Partition value used for nulls, as understood by Glue/Athena/DuckDB
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Behaviour when a partition already holds data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Add new files next to existing ones
    #[default]
    Append,
    /// Delete existing files of each written partition first
    Overwrite,
}

/// Result of an encoded upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    /// Rows encoded
    pub rows: usize,
    /// Partition paths written, e.g. `ano=2024/mes=01/dia=05`
    pub partitions: Vec<String>,
    /// Full URLs of the objects written
    pub files: Vec<String>,
    /// Objects deleted by overwrite mode
    pub files_replaced: usize,
}

/// Dataset name of a source file: its stem
pub fn dataset_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| Error::source_read(path.display().to_string(), "file has no name"))
}

/// Key prefix for the raw copy: `raw/<stem>/<YYYY>/<MM>/<DD>`
pub fn raw_prefix(path: &Path, key: &PartitionKey) -> Result<String> {
    Ok(format!("raw/{}/{}", dataset_name(path)?, key.date_path()))
}

/// Key prefix for the encoded dataset: `processed/<stem>`
pub fn processed_prefix(path: &Path) -> Result<String> {
    Ok(format!("processed/{}", dataset_name(path)?))
}

/// Writes raw files and partitioned Parquet datasets
#[derive(Debug, Clone, Default)]
pub struct Uploader {
    parquet: ParquetWriterConfig,
    mode: WriteMode,
}

impl Uploader {
    /// Create an uploader with Snappy Parquet and append mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the write mode
    #[must_use]
    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the Parquet writer configuration
    #[must_use]
    pub fn with_parquet_config(mut self, config: ParquetWriterConfig) -> Self {
        self.parquet = config;
        self
    }

    /// Copy a local file to `location`, keeping its file name
    pub async fn upload_raw(&self, local_path: &Path, location: &CloudDestination) -> Result<String> {
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::source_read(local_path.display().to_string(), "file has no name")
            })?;

        let data = tokio::fs::read(local_path)
            .await
            .map_err(|e| Error::source_read(local_path.display().to_string(), e.to_string()))?;

        let url = location.write(file_name, data.into()).await?;
        info!("Raw file uploaded to: {url}");
        Ok(url)
    }

    /// Encode `set` as Parquet under `location`, one directory level per partition column
    pub async fn upload_encoded(
        &self,
        set: &RecordSet,
        location: &CloudDestination,
        partition_columns: &[&str],
    ) -> Result<UploadSummary> {
        if set.is_empty() {
            return Err(Error::encoding("no rows to encode"));
        }

        let partitions: Vec<&str> = partition_columns
            .iter()
            .copied()
            .filter(|column| {
                let present = set.has_column(column);
                if !present {
                    warn!("Partition column '{column}' not in data, skipping it");
                }
                present
            })
            .collect();

        let schema = Arc::new(infer_schema(set, &partitions)?);
        if schema.fields().is_empty() {
            return Err(Error::encoding(
                "no data columns left after removing partition columns",
            ));
        }

        let mut groups: BTreeMap<String, Vec<&Row>> = BTreeMap::new();
        for row in set.rows() {
            groups
                .entry(partition_path(row, &partitions))
                .or_default()
                .push(row);
        }

        let mut summary = UploadSummary::default();
        for (path, rows) in groups {
            if self.mode == WriteMode::Overwrite {
                let removed = location.delete_prefix(&path).await?;
                if removed > 0 {
                    debug!("Removed {removed} existing objects under {location}/{path}");
                }
                summary.files_replaced += removed;
            }

            let batch = build_batch(&rows, &schema)?;
            let data = encode_parquet(&batch, &self.parquet)?;
            let file_name = format!("{}.{}", Uuid::new_v4(), self.parquet.file_suffix());
            let name = if path.is_empty() {
                file_name
            } else {
                format!("{path}/{file_name}")
            };

            let url = location.write(&name, data).await?;
            info!("Wrote {} rows to {url}", rows.len());

            summary.rows += rows.len();
            summary.files.push(url);
            summary.partitions.push(path);
        }

        info!(
            "Parquet dataset written to {location}: {} rows in {} partitions",
            summary.rows,
            summary.partitions.len()
        );
        Ok(summary)
    }
}

/// Hive path for one row, e.g. `ano=2024/mes=01/dia=05`
fn partition_path(row: &Row, columns: &[&str]) -> String {
    columns
        .iter()
        .map(|column| format!("{column}={}", partition_value(row.get(*column))))
        .collect::<Vec<_>>()
        .join("/")
}

fn partition_value(value: Option<&Scalar>) -> String {
    match value {
        None | Some(Scalar::Null) => HIVE_DEFAULT_PARTITION.to_string(),
        Some(v) => v.render().replace(['/', '='], "_"),
    }
}
