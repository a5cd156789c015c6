//! Parquet encoding
//!
//! Batches are encoded either into memory (for object storage uploads) or
//! straight into a local file (for result exports).

use crate::error::{Error, Result};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use clap::ValueEnum;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Rows per row group unless configured otherwise
pub const DEFAULT_ROW_GROUP_ROWS: usize = 1024 * 1024;

/// Compression codec of written Parquet files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ParquetCodec {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    None,
}

impl ParquetCodec {
    fn compression(self) -> Compression {
        match self {
            ParquetCodec::Snappy => Compression::SNAPPY,
            ParquetCodec::Zstd => Compression::ZSTD(ZstdLevel::default()),
            ParquetCodec::Gzip => Compression::GZIP(GzipLevel::default()),
            ParquetCodec::None => Compression::UNCOMPRESSED,
        }
    }

    /// File name suffix, e.g. `snappy.parquet`
    pub fn file_suffix(self) -> &'static str {
        match self {
            ParquetCodec::Snappy => "snappy.parquet",
            ParquetCodec::Zstd => "zstd.parquet",
            ParquetCodec::Gzip => "gz.parquet",
            ParquetCodec::None => "parquet",
        }
    }
}

/// Encoding options for written files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParquetWriterConfig {
    pub codec: ParquetCodec,
    pub max_row_group_rows: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            codec: ParquetCodec::default(),
            max_row_group_rows: DEFAULT_ROW_GROUP_ROWS,
        }
    }
}

impl ParquetWriterConfig {
    /// Snappy with the default row group size
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another codec
    #[must_use]
    pub fn with_codec(mut self, codec: ParquetCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Cap the rows per row group
    #[must_use]
    pub fn with_max_row_group_rows(mut self, rows: usize) -> Self {
        self.max_row_group_rows = rows;
        self
    }

    /// File name suffix for the configured codec
    pub fn file_suffix(&self) -> &'static str {
        self.codec.file_suffix()
    }

    fn properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.codec.compression())
            .set_max_row_group_size(self.max_row_group_rows)
            .build()
    }
}

/// Streams batches into one Parquet file over any sink
pub struct ParquetWriter<W: Write + Send> {
    inner: ArrowWriter<W>,
    rows: usize,
}

impl<W: Write + Send> ParquetWriter<W> {
    /// Start a file with `schema` on `sink`
    pub fn new(sink: W, schema: SchemaRef, config: &ParquetWriterConfig) -> Result<Self> {
        let inner = ArrowWriter::try_new(sink, schema, Some(config.properties()))
            .map_err(|e| Error::encoding(format!("Cannot start Parquet file: {e}")))?;
        Ok(Self { inner, rows: 0 })
    }

    /// Append a batch
    pub fn write(&mut self, batch: &RecordBatch) -> Result<()> {
        self.inner
            .write(batch)
            .map_err(|e| Error::encoding(format!("Cannot encode batch: {e}")))?;
        self.rows += batch.num_rows();
        Ok(())
    }

    /// Write the footer and return the sink with the row count
    pub fn finish(self) -> Result<(W, usize)> {
        let sink = self
            .inner
            .into_inner()
            .map_err(|e| Error::encoding(format!("Cannot finish Parquet file: {e}")))?;
        Ok((sink, self.rows))
    }
}

/// Encode one batch as an in-memory Parquet file
pub fn encode_parquet(batch: &RecordBatch, config: &ParquetWriterConfig) -> Result<Bytes> {
    let mut writer = ParquetWriter::new(Vec::new(), batch.schema(), config)?;
    writer.write(batch)?;
    let (buffer, _) = writer.finish()?;
    Ok(Bytes::from(buffer))
}

/// Encode one batch into a local file, returning the row count
pub fn write_parquet_file(
    path: impl AsRef<Path>,
    batch: &RecordBatch,
    config: &ParquetWriterConfig,
) -> Result<usize> {
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| Error::storage_write(path.display().to_string(), e.to_string()))?;
    let mut writer = ParquetWriter::new(file, batch.schema(), config)?;
    writer.write(batch)?;
    let (_, rows) = writer.finish()?;
    Ok(rows)
}
