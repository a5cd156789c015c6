//! Catalog job types

use crate::types::PollConfig;
use std::fmt;

/// Default delay between two crawler status requests
pub const DEFAULT_CRAWLER_POLL_SECS: u64 = 30;

/// Default time to wait for a crawler to finish
pub const DEFAULT_CRAWLER_TIMEOUT_SECS: u64 = 600;

/// State of an external catalog-discovery job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// The job has never run
    NotStarted,
    /// The job is scanning
    Running,
    /// The last run finished successfully
    Succeeded,
    /// The last run failed
    Failed,
    /// The last run was cancelled
    Stopped,
}

impl JobState {
    /// Check whether the job reached a final state
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Stopped
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::NotStarted => "NOT_STARTED",
            JobState::Running => "RUNNING",
            JobState::Succeeded => "SUCCEEDED",
            JobState::Failed => "FAILED",
            JobState::Stopped => "STOPPED",
        };
        f.write_str(name)
    }
}

/// Poll settings for crawlers: every 30s, up to 10 minutes
pub fn crawler_poll_default() -> PollConfig {
    PollConfig::from_secs(DEFAULT_CRAWLER_POLL_SECS, DEFAULT_CRAWLER_TIMEOUT_SECS)
}
