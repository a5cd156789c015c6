//! Local export of query results

use super::schema::record_set_to_arrow;
use super::writer::{write_parquet_file, ParquetWriterConfig};
use crate::error::{Error, Result};
use crate::types::RecordSet;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Export file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values with a header row
    #[default]
    Csv,
    /// Snappy-compressed Parquet
    Parquet,
}

/// Render a record set as CSV bytes
///
/// Absent keys and nulls are written as empty fields.
pub fn record_set_to_csv(set: &RecordSet) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(set.columns())
        .map_err(|e| Error::encoding(format!("Failed to write CSV header: {e}")))?;

    for row in set.rows() {
        let fields = set
            .columns()
            .iter()
            .map(|c| row.get(c).map(|v| v.render()).unwrap_or_default());
        writer
            .write_record(fields)
            .map_err(|e| Error::encoding(format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::encoding(format!("Failed to flush CSV: {e}")))
}

/// Write a record set to a local file, returning the row count
pub fn export_record_set(set: &RecordSet, path: &Path, format: ExportFormat) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::storage_write(parent.display().to_string(), e.to_string()))?;
    }

    let rows = match format {
        ExportFormat::Csv => {
            let data = record_set_to_csv(set)?;
            std::fs::write(path, data)
                .map_err(|e| Error::storage_write(path.display().to_string(), e.to_string()))?;
            set.len()
        }
        ExportFormat::Parquet => {
            let batch = record_set_to_arrow(set, &[])?;
            write_parquet_file(path, &batch, &ParquetWriterConfig::default())?
        }
    };

    info!("Results saved to: {}", path.display());
    Ok(rows)
}
