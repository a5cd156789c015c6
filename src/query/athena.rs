//! Amazon Athena backend

use super::types::{normalize_results_location, QueryState, QueryStatus};
use super::QueryService;
use crate::error::{Error, Result};
use crate::transform::parse_timestamp;
use crate::types::{RecordSet, Row, Scalar};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{QueryExecutionContext, QueryExecutionState, ResultConfiguration};
use aws_sdk_athena::Client;

/// Formats Athena uses for `timestamp` and `date` values
const ATHENA_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d"];

/// Query service backed by Athena
#[derive(Debug, Clone)]
pub struct AthenaQueryService {
    client: Client,
}

impl AthenaQueryService {
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
impl QueryService for AthenaQueryService {
    async fn submit(&self, sql: &str, database: &str, results_location: &str) -> Result<String> {
        let output = self
            .client
            .start_query_execution()
            .query_string(sql)
            .query_execution_context(QueryExecutionContext::builder().database(database).build())
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(normalize_results_location(results_location))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| Error::query_submission(DisplayErrorContext(&e).to_string()))?;

        output
            .query_execution_id()
            .map(ToString::to_string)
            .ok_or_else(|| Error::query_submission("no query execution id returned"))
    }

    async fn status(&self, query_id: &str) -> Result<QueryStatus> {
        let output = self
            .client
            .get_query_execution()
            .query_execution_id(query_id)
            .send()
            .await
            .map_err(|e| Error::query_execution(query_id, DisplayErrorContext(&e).to_string()))?;

        let execution = output
            .query_execution()
            .ok_or_else(|| Error::query_execution(query_id, "query execution not found"))?;
        let status = execution.status();

        let state = match status.and_then(|s| s.state()) {
            Some(QueryExecutionState::Succeeded) => QueryState::Succeeded,
            Some(QueryExecutionState::Failed) => QueryState::Failed,
            Some(QueryExecutionState::Cancelled) => QueryState::Cancelled,
            Some(QueryExecutionState::Running) => QueryState::Running,
            _ => QueryState::Queued,
        };

        Ok(QueryStatus {
            state,
            reason: status
                .and_then(|s| s.state_change_reason())
                .map(ToString::to_string),
            output_location: execution
                .result_configuration()
                .and_then(|c| c.output_location())
                .map(ToString::to_string),
        })
    }

    async fn results(&self, query_id: &str) -> Result<RecordSet> {
        let mut pages = self
            .client
            .get_query_results()
            .query_execution_id(query_id)
            .into_paginator()
            .send();

        let mut columns: Vec<(String, String)> = Vec::new();
        let mut set = RecordSet::default();
        let mut header_skipped = false;

        while let Some(page) = pages.next().await {
            let page = page
                .map_err(|e| Error::query_execution(query_id, DisplayErrorContext(&e).to_string()))?;
            let Some(result_set) = page.result_set() else {
                continue;
            };

            if columns.is_empty() {
                columns = result_set
                    .result_set_metadata()
                    .map(|m| {
                        m.column_info()
                            .iter()
                            .map(|c| (c.name().to_string(), c.r#type().to_string()))
                            .collect()
                    })
                    .unwrap_or_default();
                set = RecordSet::new(columns.iter().map(|(name, _)| name.clone()).collect());
            }

            for athena_row in result_set.rows() {
                // The first row of a SELECT result repeats the column names
                if !header_skipped {
                    header_skipped = true;
                    continue;
                }
                let row: Row = columns
                    .iter()
                    .zip(athena_row.data())
                    .map(|((name, type_name), datum)| {
                        (name.clone(), athena_value(type_name, datum.var_char_value()))
                    })
                    .collect();
                set.push(row);
            }
        }

        Ok(set)
    }
}

/// Type a raw Athena cell using the column's SQL type
pub(crate) fn athena_value(type_name: &str, raw: Option<&str>) -> Scalar {
    let Some(raw) = raw else {
        return Scalar::Null;
    };
    let base = type_name
        .split('(')
        .next()
        .unwrap_or(type_name)
        .trim()
        .to_ascii_lowercase();

    let typed = match base.as_str() {
        "tinyint" | "smallint" | "integer" | "int" | "bigint" => raw.parse().ok().map(Scalar::Int),
        "double" | "float" | "real" | "decimal" => raw.parse().ok().map(Scalar::Float),
        "boolean" => raw.parse().ok().map(Scalar::Bool),
        "timestamp" | "date" => {
            let formats: Vec<String> = ATHENA_TIMESTAMP_FORMATS
                .iter()
                .map(ToString::to_string)
                .collect();
            parse_timestamp(raw, &formats).map(Scalar::Timestamp)
        }
        _ => None,
    };

    typed.unwrap_or_else(|| Scalar::Text(raw.to_string()))
}
