//! AWS Glue crawler backend

use super::types::JobState;
use super::CatalogService;
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_glue::error::DisplayErrorContext;
use aws_sdk_glue::types::{CrawlerState, LastCrawlStatus};
use aws_sdk_glue::Client;

/// Catalog service backed by Glue crawlers
#[derive(Debug, Clone)]
pub struct GlueCatalog {
    client: Client,
}

impl GlueCatalog {
    /// Wrap an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the default credential chain
    pub async fn from_env(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl CatalogService for GlueCatalog {
    async fn start_job(&self, name: &str) -> Result<()> {
        self.client
            .start_crawler()
            .name(name)
            .send()
            .await
            .map_err(|e| {
                let message = match e.as_service_error() {
                    Some(err) if err.is_crawler_running_exception() => {
                        "crawler is already running".to_string()
                    }
                    Some(err) if err.is_entity_not_found_exception() => {
                        "crawler does not exist".to_string()
                    }
                    _ => DisplayErrorContext(&e).to_string(),
                };
                Error::catalog(name, message)
            })?;
        Ok(())
    }

    async fn job_state(&self, name: &str) -> Result<JobState> {
        let output = self
            .client
            .get_crawler()
            .name(name)
            .send()
            .await
            .map_err(|e| Error::catalog(name, DisplayErrorContext(&e).to_string()))?;

        let crawler = output
            .crawler()
            .ok_or_else(|| Error::catalog(name, "crawler does not exist"))?;

        Ok(crawler_state(
            crawler.state(),
            crawler.last_crawl().and_then(|last| last.status()),
        ))
    }
}

/// Map a crawler's state and last crawl status to a job state
pub(crate) fn crawler_state(
    state: Option<&CrawlerState>,
    last_crawl: Option<&LastCrawlStatus>,
) -> JobState {
    match state {
        Some(CrawlerState::Running | CrawlerState::Stopping) => JobState::Running,
        _ => match last_crawl {
            Some(LastCrawlStatus::Succeeded) => JobState::Succeeded,
            Some(LastCrawlStatus::Failed) => JobState::Failed,
            Some(LastCrawlStatus::Cancelled) => JobState::Stopped,
            _ => JobState::NotStarted,
        },
    }
}
