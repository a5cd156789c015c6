//! Start a catalog job and wait for it

use super::types::JobState;
use super::CatalogService;
use crate::error::{Error, Result};
use crate::types::PollConfig;
use std::sync::Arc;
use tracing::{debug, info};

/// Drives one catalog-discovery job through start and completion
#[derive(Clone)]
pub struct CatalogTrigger {
    service: Arc<dyn CatalogService>,
    poll: PollConfig,
}

impl CatalogTrigger {
    /// Create a trigger over a catalog service
    pub fn new(service: Arc<dyn CatalogService>, poll: PollConfig) -> Self {
        Self { service, poll }
    }

    /// Ask the service to start a scan
    pub async fn start(&self, job: &str) -> Result<()> {
        info!("Starting crawler: {job}");
        self.service.start_job(job).await?;
        info!("Crawler {job} started");
        Ok(())
    }

    /// Poll the job every `poll.interval` until it is terminal
    ///
    /// The first status request is sent immediately.
    pub async fn await_completion(&self, job: &str, poll: PollConfig) -> Result<JobState> {
        let wait = async {
            let mut attempts = 0_u32;
            loop {
                attempts += 1;
                let state = self.service.job_state(job).await?;
                debug!("Crawler {job} poll #{attempts}: {state}");
                if state.is_terminal() {
                    return Ok::<_, Error>(state);
                }
                info!("Crawler {job} is {state}, checking again in {:?}", poll.interval);
                tokio::time::sleep(poll.interval).await;
            }
        };

        match tokio::time::timeout(poll.timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(Error::CatalogTimeout {
                job: job.to_string(),
                timeout: poll.timeout,
            }),
        }
    }

    /// Start the job, wait for it and require success
    pub async fn run(&self, job: &str) -> Result<JobState> {
        self.start(job).await?;
        let state = self.await_completion(job, self.poll).await?;
        if state != JobState::Succeeded {
            return Err(Error::catalog(job, format!("finished with state {state}")));
        }
        info!("Crawler {job} completed successfully");
        Ok(state)
    }
}
