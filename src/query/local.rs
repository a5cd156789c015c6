//! Local DuckDB backend
//!
//! Tables come from the local catalog manifest of the requested database;
//! each one is exposed as a view over its Hive-partitioned Parquet files.
//! Queries run to completion inside `submit`.

use super::types::{QueryState, QueryStatus};
use super::QueryService;
use crate::catalog::CatalogManifest;
use crate::error::{Error, Result};
use crate::output::{record_set_to_csv, CloudDestination};
use crate::types::{RecordSet, Row, Scalar};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Outcome of one local execution
#[derive(Debug, Clone)]
struct Execution {
    status: QueryStatus,
    results: Option<RecordSet>,
}

/// Query service running SQL in an in-memory DuckDB
#[derive(Debug)]
pub struct DuckDbQueryService {
    catalog_dir: PathBuf,
    executions: Mutex<HashMap<String, Execution>>,
}

impl DuckDbQueryService {
    /// Create a service reading database manifests from `catalog_dir`
    pub fn new(catalog_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog_dir: catalog_dir.into(),
            executions: Mutex::new(HashMap::new()),
        }
    }

    async fn execution(&self, query_id: &str) -> Result<Execution> {
        self.executions
            .lock()
            .await
            .get(query_id)
            .cloned()
            .ok_or_else(|| Error::query_execution(query_id, "query not found"))
    }
}

#[async_trait]
impl QueryService for DuckDbQueryService {
    async fn submit(&self, sql: &str, database: &str, results_location: &str) -> Result<String> {
        if sql.trim().is_empty() {
            return Err(Error::query_submission("empty query"));
        }
        if !CatalogManifest::path(&self.catalog_dir, database).exists() {
            return Err(Error::query_submission(format!(
                "database '{database}' does not exist"
            )));
        }
        let manifest = CatalogManifest::load(&self.catalog_dir, database)
            .map_err(|e| Error::query_submission(e.to_string()))?;

        let sql = sql.to_string();
        let outcome = tokio::task::spawn_blocking(move || {
            let conn = open_database(&manifest)?;
            Ok::<_, Error>(execute(&conn, &sql))
        })
        .await
        .map_err(|e| Error::Other(format!("Query task failed: {e}")))??;

        let query_id = Uuid::new_v4().to_string();
        let execution = match outcome {
            Ok(set) => {
                let destination = CloudDestination::parse(results_location, None)
                    .map_err(|e| Error::query_submission(e.to_string()))?;
                let output = destination
                    .write(&format!("{query_id}.csv"), record_set_to_csv(&set)?.into())
                    .await?;
                Execution {
                    status: QueryStatus::new(QueryState::Succeeded).with_output_location(output),
                    results: Some(set),
                }
            }
            Err(message) => Execution {
                status: QueryStatus::failed(message),
                results: None,
            },
        };

        self.executions
            .lock()
            .await
            .insert(query_id.clone(), execution);
        Ok(query_id)
    }

    async fn status(&self, query_id: &str) -> Result<QueryStatus> {
        Ok(self.execution(query_id).await?.status)
    }

    async fn results(&self, query_id: &str) -> Result<RecordSet> {
        let execution = self.execution(query_id).await?;
        execution.results.ok_or_else(|| {
            Error::query_execution(
                query_id,
                format!("query is {}, no results", execution.status.state),
            )
        })
    }
}

/// Open an in-memory database with one view per catalogued table
fn open_database(manifest: &CatalogManifest) -> Result<Connection> {
    let conn = Connection::open_in_memory()
        .map_err(|e| Error::query_submission(format!("Failed to open DuckDB: {e}")))?;
    for (table, location) in &manifest.tables {
        let view = view_sql(table, location);
        debug!("Registering table: {view}");
        conn.execute_batch(&view).map_err(|e| {
            Error::query_submission(format!("Failed to register table {table}: {e}"))
        })?;
    }
    Ok(conn)
}

fn view_sql(table: &str, location: &std::path::Path) -> String {
    let glob = location.join("**").join("*.parquet");
    format!(
        "CREATE OR REPLACE VIEW \"{}\" AS SELECT * FROM read_parquet('{}', \
         hive_partitioning = true, hive_types_autocast = false, union_by_name = true)",
        table.replace('"', "\"\""),
        glob.display().to_string().replace('\'', "''"),
    )
}

/// Run one statement; errors are the engine's message
fn execute(conn: &Connection, sql: &str) -> std::result::Result<RecordSet, String> {
    let mut stmt = conn.prepare(sql).map_err(|e| e.to_string())?;
    let mut rows = stmt.query([]).map_err(|e| e.to_string())?;

    let columns: Vec<String> = rows
        .as_ref()
        .map(|s| s.column_names().into_iter().map(|n| n.to_string()).collect())
        .unwrap_or_default();
    let mut set = RecordSet::new(columns.clone());

    while let Some(db_row) = rows.next().map_err(|e| e.to_string())? {
        let mut row = Row::new();
        for (idx, name) in columns.iter().enumerate() {
            let value: Value = db_row.get(idx).map_err(|e| e.to_string())?;
            row.insert(name.clone(), duckdb_value_to_scalar(value));
        }
        set.push(row);
    }

    Ok(set)
}

/// Convert a DuckDB value to a scalar
fn duckdb_value_to_scalar(value: Value) -> Scalar {
    match value {
        Value::Null => Scalar::Null,
        Value::Boolean(b) => Scalar::Bool(b),
        Value::TinyInt(i) => Scalar::Int(i.into()),
        Value::SmallInt(i) => Scalar::Int(i.into()),
        Value::Int(i) => Scalar::Int(i.into()),
        Value::BigInt(i) => Scalar::Int(i),
        Value::UTinyInt(i) => Scalar::Int(i.into()),
        Value::USmallInt(i) => Scalar::Int(i.into()),
        Value::UInt(i) => Scalar::Int(i.into()),
        Value::UBigInt(i) => i64::try_from(i).map_or(Scalar::Text(i.to_string()), Scalar::Int),
        Value::HugeInt(i) => i64::try_from(i).map_or(Scalar::Text(i.to_string()), Scalar::Int),
        Value::Float(f) => Scalar::Float(f.into()),
        Value::Double(f) => Scalar::Float(f),
        Value::Decimal(d) => d
            .to_string()
            .parse()
            .map_or(Scalar::Text(d.to_string()), Scalar::Float),
        Value::Text(s) => Scalar::Text(s),
        Value::Timestamp(unit, t) => {
            let micros = match unit {
                TimeUnit::Second => t.saturating_mul(1_000_000),
                TimeUnit::Millisecond => t.saturating_mul(1_000),
                TimeUnit::Microsecond => t,
                TimeUnit::Nanosecond => t / 1_000,
            };
            DateTime::from_timestamp_micros(micros)
                .map_or(Scalar::Int(t), |dt| Scalar::Timestamp(dt.naive_utc()))
        }
        Value::Date32(d) => {
            // Days since epoch (719163 is the number of days from 1 CE to 1970-01-01)
            NaiveDate::from_num_days_from_ce_opt(d + 719_163)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map_or(Scalar::Int(d.into()), Scalar::Timestamp)
        }
        other => Scalar::Text(format!("{other:?}")),
    }
}
