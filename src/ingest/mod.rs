//! Ingest module
//!
//! Reads a local delimited file into an in-memory [`RecordSet`](crate::types::RecordSet).
//! Column types are inferred per column (int, float, bool, text); cells
//! matching [`NULL_MARKERS`] become nulls.

mod reader;

pub use reader::{CsvIngestor, NULL_MARKERS};

#[cfg(test)]
mod tests;
