//! Tests for engine module

use super::*;
use crate::catalog::JobState;
use crate::error::{Error, Stage};
use crate::output::WriteMode;
use crate::transform::PartitionKey;
use crate::types::PollConfig;
use async_trait::async_trait;
use object_store::memory::InMemory;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Catalog whose crawls always end in the given state
struct FixedCatalog {
    result: JobState,
    starts: AtomicUsize,
}

impl FixedCatalog {
    fn new(result: JobState) -> Arc<Self> {
        Arc::new(Self {
            result,
            starts: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl CatalogService for FixedCatalog {
    async fn start_job(&self, _name: &str) -> crate::Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn job_state(&self, _name: &str) -> crate::Result<JobState> {
        Ok(self.result)
    }
}

struct Fixture {
    _dir: TempDir,
    csv: std::path::PathBuf,
    raw: CloudDestination,
    processed: CloudDestination,
}

fn fixture(content: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("vendas.csv");
    std::fs::write(&csv, content).unwrap();
    Fixture {
        _dir: dir,
        csv,
        raw: CloudDestination::from_store(Arc::new(InMemory::new()), "memory", "raw-bucket"),
        processed: CloudDestination::from_store(
            Arc::new(InMemory::new()),
            "memory",
            "processed-bucket",
        ),
    }
}

fn config() -> PipelineConfig {
    PipelineConfig::new("meu-crawler-parquet", PartitionKey::parse("2024-01-05").unwrap())
        .with_crawler_poll(PollConfig::from_secs(1, 10))
}

const SALES: &str = "\
produto,preco,quantidade,data_venda
caneta,10,3,2024-01-03
caneta,10,3,2024-01-03
lapis,2,,2024-01-04
";

#[tokio::test]
async fn test_pipeline_runs_all_stages() {
    let fx = fixture(SALES);
    let catalog = FixedCatalog::new(JobState::Succeeded);
    let pipeline = Pipeline::new(config(), fx.raw.clone(), fx.processed.clone(), catalog.clone());

    let report = pipeline.run(&fx.csv).await.unwrap();

    assert_eq!(report.dataset, "vendas");
    assert_eq!(report.rows_read, 3);
    assert_eq!(report.transform.duplicates_removed, 1);
    assert_eq!(report.upload.rows, 2);
    assert_eq!(report.catalog_state, JobState::Succeeded);
    assert_eq!(
        report.raw_object,
        "memory://raw-bucket/raw/vendas/2024/01/05/vendas.csv"
    );
    assert_eq!(report.upload.partitions, vec!["ano=2024/mes=01/dia=05"]);
    assert_eq!(catalog.starts.load(Ordering::SeqCst), 1);

    let raw = fx.raw.read("raw/vendas/2024/01/05/vendas.csv").await.unwrap();
    assert_eq!(raw.as_ref(), SALES.as_bytes());

    let files = fx.processed.list("processed/vendas").await.unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("processed/vendas/ano=2024/mes=01/dia=05/"));
}

#[tokio::test]
async fn test_transform_failure_keeps_raw_copy() {
    let fx = fixture("produto,data_venda\ncaneta,ontem\n");
    let pipeline = Pipeline::new(
        config(),
        fx.raw.clone(),
        fx.processed.clone(),
        FixedCatalog::new(JobState::Succeeded),
    );

    let err = pipeline.run(&fx.csv).await.unwrap_err();
    assert_eq!(err.stage(), Stage::Transform);
    assert_eq!(fx.raw.list("raw").await.unwrap().len(), 1);
    assert!(fx.processed.list("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_source_aborts_before_upload() {
    let fx = fixture(SALES);
    let pipeline = Pipeline::new(
        config(),
        fx.raw.clone(),
        fx.processed.clone(),
        FixedCatalog::new(JobState::Succeeded),
    );

    let err = pipeline
        .run(Path::new("/nonexistent/vendas.csv"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SourceRead { .. }));
    assert!(fx.raw.list("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_crawl_fails_run() {
    let fx = fixture(SALES);
    let pipeline = Pipeline::new(
        config(),
        fx.raw.clone(),
        fx.processed.clone(),
        FixedCatalog::new(JobState::Failed),
    );

    let err = pipeline.run(&fx.csv).await.unwrap_err();
    assert_eq!(err.stage(), Stage::Catalog);
}

#[tokio::test]
async fn test_overwrite_mode_reruns_cleanly() {
    let fx = fixture(SALES);
    let pipeline = Pipeline::new(
        config().with_write_mode(WriteMode::Overwrite),
        fx.raw.clone(),
        fx.processed.clone(),
        FixedCatalog::new(JobState::Succeeded),
    );

    pipeline.run(&fx.csv).await.unwrap();
    let report = pipeline.run(&fx.csv).await.unwrap();

    assert_eq!(report.upload.files_replaced, 1);
    assert_eq!(fx.processed.list("processed/vendas").await.unwrap().len(), 1);
}

#[test]
fn test_pipeline_config_defaults() {
    let config = PipelineConfig::new("crawler", PartitionKey::parse("2024-01-05").unwrap());
    assert_eq!(config.delimiter, b',');
    assert_eq!(config.write_mode, WriteMode::Append);
    assert_eq!(config.crawler_poll, crate::catalog::crawler_poll_default());
}
