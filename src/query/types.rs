//! Query execution types

use crate::types::PollConfig;
use std::fmt;

/// Default delay between two query status requests
pub const DEFAULT_QUERY_POLL_SECS: u64 = 1;

/// Default time to wait for a query to finish
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 100;

/// Execution state reported by the query engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl QueryState {
    /// Check whether the query reached a final state
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            QueryState::Succeeded | QueryState::Failed | QueryState::Cancelled
        )
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryState::Queued => "QUEUED",
            QueryState::Running => "RUNNING",
            QueryState::Succeeded => "SUCCEEDED",
            QueryState::Failed => "FAILED",
            QueryState::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

/// Status of one query execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStatus {
    pub state: QueryState,
    /// Engine-provided reason for failures
    pub reason: Option<String>,
    /// Where the engine stored the result file
    pub output_location: Option<String>,
}

impl QueryStatus {
    /// Status without reason or output location
    pub fn new(state: QueryState) -> Self {
        Self {
            state,
            reason: None,
            output_location: None,
        }
    }

    /// Failed status with the engine's message
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            state: QueryState::Failed,
            reason: Some(reason.into()),
            output_location: None,
        }
    }

    /// Set the output location
    #[must_use]
    pub fn with_output_location(mut self, location: impl Into<String>) -> Self {
        self.output_location = Some(location.into());
        self
    }
}

/// Poll settings for queries: every second, up to 100 seconds
pub fn query_poll_default() -> PollConfig {
    PollConfig::from_secs(DEFAULT_QUERY_POLL_SECS, DEFAULT_QUERY_TIMEOUT_SECS)
}

/// Normalise a results location to `s3://bucket/prefix/`
pub fn normalize_results_location(location: &str) -> String {
    let mut normalized = if location.starts_with("s3://") {
        location.to_string()
    } else {
        format!("s3://{location}")
    };
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}
