//! Tests for query module

use super::athena::athena_value;
use super::*;
use crate::catalog::CatalogManifest;
use crate::error::Error;
use crate::output::{record_set_to_arrow, write_parquet_file, ParquetWriterConfig};
use crate::types::{row, PollConfig, Scalar};
use async_trait::async_trait;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_case::test_case;

/// Scripted engine: records the submission and plays back statuses
struct StubEngine {
    statuses: Mutex<VecDeque<QueryStatus>>,
    submitted: Mutex<Vec<(String, String, String)>>,
    rows: RecordSet,
}

impl StubEngine {
    fn new(statuses: Vec<QueryStatus>, rows: RecordSet) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            submitted: Mutex::new(Vec::new()),
            rows,
        }
    }
}

#[async_trait]
impl QueryService for StubEngine {
    async fn submit(&self, sql: &str, database: &str, results_location: &str) -> crate::Result<String> {
        if sql.trim().is_empty() {
            return Err(Error::query_submission("empty query"));
        }
        self.submitted.lock().unwrap().push((
            sql.to_string(),
            database.to_string(),
            results_location.to_string(),
        ));
        Ok("q-1".to_string())
    }

    async fn status(&self, _query_id: &str) -> crate::Result<QueryStatus> {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            Ok(statuses.pop_front().unwrap())
        } else {
            Ok(statuses.front().cloned().unwrap())
        }
    }

    async fn results(&self, _query_id: &str) -> crate::Result<RecordSet> {
        Ok(self.rows.clone())
    }
}

fn one_row() -> RecordSet {
    RecordSet::from_rows(vec![row([("_col0", Scalar::Int(1))])])
}

fn runner(engine: Arc<StubEngine>, timeout: u64) -> QueryRunner {
    QueryRunner::new(engine, PollConfig::from_secs(1, timeout))
}

// ============================================================================
// Runner Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_run_query_select_one() {
    let engine = Arc::new(StubEngine::new(
        vec![
            QueryStatus::new(QueryState::Queued),
            QueryStatus::new(QueryState::Running),
            QueryStatus::new(QueryState::Succeeded),
        ],
        one_row(),
    ));
    let result = runner(engine.clone(), 100)
        .run_query("SELECT 1", "db", "s3://out/")
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.get(0, "_col0"), Some(&Scalar::Int(1)));
    assert_eq!(
        engine.submitted.lock().unwrap()[0],
        (
            "SELECT 1".to_string(),
            "db".to_string(),
            "s3://out/".to_string()
        )
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_query_carries_engine_message() {
    let engine = Arc::new(StubEngine::new(
        vec![QueryStatus::failed("SYNTAX_ERROR: line 1:8")],
        RecordSet::default(),
    ));
    let err = runner(engine, 100)
        .run_query("SELEC 1", "db", "s3://out/")
        .await
        .unwrap_err();
    match err {
        Error::QueryExecution { query_id, message } => {
            assert_eq!(query_id, "q-1");
            assert_eq!(message, "SYNTAX_ERROR: line 1:8");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_query_is_execution_error() {
    let engine = Arc::new(StubEngine::new(
        vec![QueryStatus::new(QueryState::Cancelled)],
        RecordSet::default(),
    ));
    let err = runner(engine, 100).wait("q-1").await.unwrap_err();
    assert!(err.to_string().contains("cancelled"));
}

#[tokio::test(start_paused = true)]
async fn test_query_timeout() {
    let engine = Arc::new(StubEngine::new(
        vec![QueryStatus::new(QueryState::Running)],
        RecordSet::default(),
    ));
    let err = runner(engine, 5)
        .run_query("SELECT 1", "db", "s3://out/")
        .await
        .unwrap_err();
    match err {
        Error::QueryTimeout { query_id, timeout } => {
            assert_eq!(query_id, "q-1");
            assert_eq!(timeout, Duration::from_secs(5));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_submission_error_passes_through() {
    let engine = Arc::new(StubEngine::new(
        vec![QueryStatus::new(QueryState::Succeeded)],
        RecordSet::default(),
    ));
    let err = runner(engine, 100).submit("  ", "db", "s3://out/").await.unwrap_err();
    assert!(matches!(err, Error::QuerySubmission { .. }));
}

// ============================================================================
// Helpers
// ============================================================================

#[test_case("seu-bucket-athena-results", "s3://seu-bucket-athena-results/" ; "bare bucket")]
#[test_case("s3://out", "s3://out/" ; "missing slash")]
#[test_case("s3://out/prefix/", "s3://out/prefix/" ; "already normal")]
fn test_normalize_results_location(input: &str, expected: &str) {
    assert_eq!(normalize_results_location(input), expected);
}

#[test]
fn test_athena_value_typing() {
    assert_eq!(athena_value("integer", Some("1")), Scalar::Int(1));
    assert_eq!(athena_value("bigint", Some("-7")), Scalar::Int(-7));
    assert_eq!(athena_value("double", Some("2.5")), Scalar::Float(2.5));
    assert_eq!(athena_value("decimal(10,2)", Some("3.10")), Scalar::Float(3.1));
    assert_eq!(athena_value("boolean", Some("true")), Scalar::Bool(true));
    assert_eq!(athena_value("varchar", Some("caneta")), Scalar::from("caneta"));
    assert_eq!(athena_value("varchar", None), Scalar::Null);
    assert_eq!(
        athena_value("timestamp", Some("2024-01-03 08:15:00.000")),
        Scalar::Timestamp(
            NaiveDate::from_ymd_opt(2024, 1, 3)
                .unwrap()
                .and_hms_opt(8, 15, 0)
                .unwrap()
        )
    );
    assert_eq!(
        athena_value("date", Some("2024-01-03")),
        Scalar::Timestamp(
            NaiveDate::from_ymd_opt(2024, 1, 3)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        )
    );
    assert_eq!(athena_value("integer", Some("abc")), Scalar::from("abc"));
}

// ============================================================================
// DuckDB Backend Tests
// ============================================================================

#[tokio::test]
async fn test_duckdb_select_one() {
    let lake = tempfile::tempdir().unwrap();
    let catalog_dir = lake.path().join("_catalog");
    CatalogManifest::default().save(&catalog_dir, "db").unwrap();
    let results = lake.path().join("results");

    let service = Arc::new(DuckDbQueryService::new(&catalog_dir));
    let runner = QueryRunner::new(service, query_poll_default());
    let set = runner
        .run_query("SELECT 1 AS _col0", "db", results.to_str().unwrap())
        .await
        .unwrap();

    assert_eq!(set.get(0, "_col0"), Some(&Scalar::Int(1)));
    let written: Vec<_> = std::fs::read_dir(&results).unwrap().collect();
    assert_eq!(written.len(), 1);
}

#[tokio::test]
async fn test_duckdb_reads_hive_partitioned_table() {
    let lake = tempfile::tempdir().unwrap();
    let table_dir = lake.path().join("processed/vendas");
    let partition = table_dir.join("ano=2024/mes=01/dia=05");
    std::fs::create_dir_all(&partition).unwrap();

    let set = RecordSet::from_rows(vec![
        row([("produto", Scalar::from("caneta")), ("preco", Scalar::Int(10))]),
        row([("produto", Scalar::from("lapis")), ("preco", Scalar::Int(2))]),
    ]);
    let batch = record_set_to_arrow(&set, &[]).unwrap();
    write_parquet_file(
        partition.join("part.snappy.parquet"),
        &batch,
        &ParquetWriterConfig::default(),
    )
    .unwrap();

    let catalog_dir = lake.path().join("_catalog");
    let mut manifest = CatalogManifest::default();
    manifest.tables.insert("vendas".to_string(), table_dir);
    manifest.save(&catalog_dir, "meu_database").unwrap();

    let runner = QueryRunner::new(
        Arc::new(DuckDbQueryService::new(&catalog_dir)),
        query_poll_default(),
    );
    let result = runner
        .run_query(
            "SELECT produto, preco, ano, mes FROM vendas ORDER BY preco",
            "meu_database",
            lake.path().join("results").to_str().unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result.get(0, "produto"), Some(&Scalar::from("lapis")));
    assert_eq!(result.get(1, "preco"), Some(&Scalar::Int(10)));
    assert_eq!(result.get(0, "ano"), Some(&Scalar::from("2024")));
    assert_eq!(result.get(0, "mes"), Some(&Scalar::from("01")));
}

#[tokio::test]
async fn test_duckdb_sql_error_is_execution_error() {
    let lake = tempfile::tempdir().unwrap();
    let catalog_dir = lake.path().join("_catalog");
    CatalogManifest::default().save(&catalog_dir, "db").unwrap();

    let runner = QueryRunner::new(
        Arc::new(DuckDbQueryService::new(&catalog_dir)),
        query_poll_default(),
    );
    let err = runner
        .run_query(
            "SELECT * FROM tabela_inexistente",
            "db",
            lake.path().join("results").to_str().unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::QueryExecution { .. }));
}

#[tokio::test]
async fn test_duckdb_unknown_database_is_submission_error() {
    let lake = tempfile::tempdir().unwrap();
    let service = DuckDbQueryService::new(lake.path());
    let err = service
        .submit("SELECT 1", "nope", lake.path().to_str().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::QuerySubmission { .. }));
}
