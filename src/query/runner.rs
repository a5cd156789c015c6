//! Submit, wait for and fetch queries

use super::types::{QueryState, QueryStatus};
use super::QueryService;
use crate::error::{Error, Result};
use crate::types::{PollConfig, RecordSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Runs SQL through a query service with fixed-interval polling
#[derive(Clone)]
pub struct QueryRunner {
    service: Arc<dyn QueryService>,
    poll: PollConfig,
}

impl QueryRunner {
    /// Create a runner over a query service
    pub fn new(service: Arc<dyn QueryService>, poll: PollConfig) -> Self {
        Self { service, poll }
    }

    /// Submit, wait and fetch the result rows
    pub async fn run_query(
        &self,
        sql: &str,
        database: &str,
        results_location: &str,
    ) -> Result<RecordSet> {
        let query_id = self.submit(sql, database, results_location).await?;
        self.wait(&query_id).await?;
        self.fetch(&query_id).await
    }

    /// Submit without waiting, returning the query id
    pub async fn submit(&self, sql: &str, database: &str, results_location: &str) -> Result<String> {
        debug!("Executing query: {sql}");
        let query_id = self.service.submit(sql, database, results_location).await?;
        info!("Query started. ID: {query_id}");
        Ok(query_id)
    }

    /// Poll until the query is terminal; only success returns `Ok`
    pub async fn wait(&self, query_id: &str) -> Result<QueryStatus> {
        let poll = async {
            loop {
                let status = self.service.status(query_id).await?;
                debug!("Query {query_id} state: {}", status.state);
                if status.state.is_terminal() {
                    return Ok::<_, Error>(status);
                }
                tokio::time::sleep(self.poll.interval).await;
            }
        };

        let status = tokio::time::timeout(self.poll.timeout, poll)
            .await
            .map_err(|_| Error::QueryTimeout {
                query_id: query_id.to_string(),
                timeout: self.poll.timeout,
            })??;

        match status.state {
            QueryState::Succeeded => {
                info!("Query {query_id} completed successfully");
                if let Some(location) = &status.output_location {
                    info!("Results saved in: {location}");
                }
                Ok(status)
            }
            QueryState::Cancelled => Err(Error::query_execution(
                query_id,
                status.reason.unwrap_or_else(|| "query was cancelled".to_string()),
            )),
            _ => Err(Error::query_execution(
                query_id,
                status.reason.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }

    /// Fetch the rows of a finished query
    pub async fn fetch(&self, query_id: &str) -> Result<RecordSet> {
        let set = self.service.results(query_id).await?;
        info!("Results fetched: {} rows", set.len());
        Ok(set)
    }
}
