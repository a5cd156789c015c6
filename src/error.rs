//! Error types for lake-etl
//!
//! This module defines the error hierarchy for the whole pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Every error belongs to exactly one pipeline [`Stage`], which the CLI
//! prints next to the message.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Settings, arguments, transform config files
    Config,
    /// Reading the source file
    Ingest,
    /// Row/column cleanups
    Transform,
    /// Raw and encoded uploads
    Upload,
    /// Catalog discovery job
    Catalog,
    /// SQL query execution
    Query,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Ingest => "ingest",
            Stage::Transform => "transform",
            Stage::Upload => "upload",
            Stage::Catalog => "catalog",
            Stage::Query => "query",
        };
        f.write_str(name)
    }
}

/// The main error type for lake-etl
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ============================================================================
    // Ingest Errors
    // ============================================================================
    #[error("Failed to read source '{path}': {message}")]
    SourceRead { path: String, message: String },

    // ============================================================================
    // Transform Errors
    // ============================================================================
    #[error("Cannot coerce '{value}' in column '{column}' (row {row}) to a timestamp")]
    TypeCoercion {
        column: String,
        row: usize,
        value: String,
    },

    // ============================================================================
    // Upload Errors
    // ============================================================================
    #[error("Encoding error: {message}")]
    Encoding { message: String },

    #[error("Failed to write {location}: {message}")]
    StorageWrite { location: String, message: String },

    // ============================================================================
    // Catalog Errors
    // ============================================================================
    #[error("Catalog job '{job}' failed: {message}")]
    CatalogTrigger { job: String, message: String },

    #[error("Catalog job '{job}' did not finish within {}s", timeout.as_secs())]
    CatalogTimeout { job: String, timeout: Duration },

    // ============================================================================
    // Query Errors
    // ============================================================================
    #[error("Query submission rejected: {message}")]
    QuerySubmission { message: String },

    #[error("Query {query_id} failed: {message}")]
    QueryExecution { query_id: String, message: String },

    #[error("Query {query_id} did not finish within {}s", timeout.as_secs())]
    QueryTimeout { query_id: String, timeout: Duration },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error("{message}: {source}")]
    Context {
        message: String,
        source: Box<Error>,
    },
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a source read error
    pub fn source_read(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceRead {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Create a storage write error
    pub fn storage_write(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageWrite {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create a catalog trigger error
    pub fn catalog(job: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CatalogTrigger {
            job: job.into(),
            message: message.into(),
        }
    }

    /// Create a query submission error
    pub fn query_submission(message: impl Into<String>) -> Self {
        Self::QuerySubmission {
            message: message.into(),
        }
    }

    /// Create a query execution error
    pub fn query_execution(query_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryExecution {
            query_id: query_id.into(),
            message: message.into(),
        }
    }

    /// The pipeline stage this error belongs to
    pub fn stage(&self) -> Stage {
        match self {
            Error::Config { .. }
            | Error::InvalidConfigValue { .. }
            | Error::YamlParse(_)
            | Error::Json(_) => Stage::Config,
            Error::SourceRead { .. } | Error::Io(_) => Stage::Ingest,
            Error::TypeCoercion { .. } => Stage::Transform,
            Error::Encoding { .. } | Error::StorageWrite { .. } => Stage::Upload,
            Error::CatalogTrigger { .. } | Error::CatalogTimeout { .. } => Stage::Catalog,
            Error::QuerySubmission { .. }
            | Error::QueryExecution { .. }
            | Error::QueryTimeout { .. } => Stage::Query,
            Error::Other(_) => Stage::Config,
            Error::Context { source, .. } => source.stage(),
        }
    }

    /// Check if this is one of the timeout variants
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::CatalogTimeout { .. } | Error::QueryTimeout { .. } => true,
            Error::Context { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

/// Result type alias for lake-etl
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
///
/// The wrapped error keeps the stage of the error it wraps.
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Context {
            message: message.into(),
            source: Box::new(e.into()),
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| Error::Context {
            message: f(),
            source: Box::new(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::source_read("vendas.csv", "No such file");
        assert_eq!(
            err.to_string(),
            "Failed to read source 'vendas.csv': No such file"
        );

        let err = Error::CatalogTimeout {
            job: "job1".to_string(),
            timeout: Duration::from_secs(600),
        };
        assert_eq!(
            err.to_string(),
            "Catalog job 'job1' did not finish within 600s"
        );
    }

    #[test]
    fn test_stage_mapping() {
        assert_eq!(Error::config("x").stage(), Stage::Config);
        assert_eq!(Error::source_read("a", "b").stage(), Stage::Ingest);
        assert_eq!(
            Error::TypeCoercion {
                column: "data".to_string(),
                row: 1,
                value: "abc".to_string(),
            }
            .stage(),
            Stage::Transform
        );
        assert_eq!(Error::encoding("x").stage(), Stage::Upload);
        assert_eq!(Error::storage_write("s3://b/k", "denied").stage(), Stage::Upload);
        assert_eq!(Error::catalog("job1", "running").stage(), Stage::Catalog);
        assert_eq!(Error::query_submission("bad").stage(), Stage::Query);
        assert_eq!(Error::query_execution("q1", "boom").stage(), Stage::Query);
    }

    #[test]
    fn test_is_timeout() {
        assert!(Error::QueryTimeout {
            query_id: "q".to_string(),
            timeout: Duration::from_secs(1),
        }
        .is_timeout());
        assert!(!Error::catalog("job1", "x").is_timeout());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Upload.to_string(), "upload");
        assert_eq!(Stage::Catalog.to_string(), "catalog");
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }

    #[test]
    fn test_context_keeps_stage() {
        let result: Result<()> = Err(Error::storage_write("out/result.csv", "denied"));
        let err = result.context("Failed to export").unwrap_err();
        assert_eq!(err.stage(), Stage::Upload);
        assert_eq!(
            err.to_string(),
            "Failed to export: Failed to write out/result.csv: denied"
        );

        let result: Result<()> = Err(Error::QueryTimeout {
            query_id: "q".to_string(),
            timeout: Duration::from_secs(1),
        });
        let err = result.with_context(|| "Waiting for q".to_string()).unwrap_err();
        assert_eq!(err.stage(), Stage::Query);
        assert!(err.is_timeout());
    }
}
