//! Query module
//!
//! Submits SQL to an external engine (Athena, or DuckDB over the local
//! lake), polls it to completion and materialises the result rows.
//! SQL text is passed through verbatim.

mod athena;
mod local;
mod runner;
mod types;

pub use athena::AthenaQueryService;
pub use local::DuckDbQueryService;
pub use runner::QueryRunner;
pub use types::{
    normalize_results_location, query_poll_default, QueryState, QueryStatus,
    DEFAULT_QUERY_POLL_SECS, DEFAULT_QUERY_TIMEOUT_SECS,
};

use crate::error::Result;
use crate::types::RecordSet;
use async_trait::async_trait;

/// External SQL execution service
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Start a query against `database`, returning its id
    async fn submit(&self, sql: &str, database: &str, results_location: &str) -> Result<String>;

    /// Current status of a query
    async fn status(&self, query_id: &str) -> Result<QueryStatus>;

    /// Result rows of a finished query
    async fn results(&self, query_id: &str) -> Result<RecordSet>;
}

#[cfg(test)]
mod tests;
