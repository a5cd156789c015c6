//! Transform module
//!
//! Fixed cleanups applied to an ingested record set before upload.
//!
//! # Overview
//!
//! In order:
//! - date-like columns are coerced to timestamps
//! - nulls are replaced by configured defaults
//! - exact-duplicate rows are removed
//! - derived columns are computed
//! - the run's partition key is stamped on every row

mod transformer;
mod types;

pub use transformer::{parse_timestamp, Transformer};
pub use types::{
    CoercionPolicy, DateConfig, DerivedColumn, DerivedOp, FillConfig, PartitionKey,
    TransformConfig, TransformStats, DEFAULT_TEXT_FILL, PARTITION_COLUMNS,
};
