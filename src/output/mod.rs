//! Output module
//!
//! Handles Arrow encoding, Parquet writing and object storage uploads.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Inferring one Arrow schema for a whole record set
//! - Converting record sets to Arrow RecordBatches
//! - Writing Parquet files and in-memory Parquet buffers
//! - Object storage destinations (S3, local filesystem)
//! - Raw and Hive-partitioned uploads
//! - Exporting query results to local CSV/Parquet files

mod cloud;
mod export;
mod schema;
mod uploader;
mod writer;

pub use cloud::CloudDestination;
pub use export::{export_record_set, record_set_to_csv, ExportFormat};
pub use schema::{build_batch, infer_schema, record_set_to_arrow};
pub use uploader::{
    dataset_name, processed_prefix, raw_prefix, UploadSummary, Uploader, WriteMode,
    HIVE_DEFAULT_PARTITION,
};
pub use writer::{
    encode_parquet, write_parquet_file, ParquetCodec, ParquetWriter, ParquetWriterConfig,
    DEFAULT_ROW_GROUP_ROWS,
};
