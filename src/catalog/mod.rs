//! Catalog module
//!
//! Starts an external catalog-discovery job (a Glue crawler, or a local
//! directory scan) and polls it until it reaches a terminal state.

mod glue;
mod local;
mod trigger;
mod types;

pub use glue::GlueCatalog;
pub use local::{discover_tables, CatalogManifest, LocalCatalog};
pub use trigger::CatalogTrigger;
pub use types::{
    crawler_poll_default, JobState, DEFAULT_CRAWLER_POLL_SECS, DEFAULT_CRAWLER_TIMEOUT_SECS,
};

use crate::error::Result;
use async_trait::async_trait;

/// External catalog-discovery service
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Request a scan; fails if the job is already running or does not exist
    async fn start_job(&self, name: &str) -> Result<()>;

    /// Current state of the job
    async fn job_state(&self, name: &str) -> Result<JobState>;
}
