//! End-to-end tests on the local backend: CSV to Parquet, crawl, SQL

use lake_etl::catalog::CatalogManifest;
use lake_etl::config::{Backend, Settings};
use lake_etl::engine::{Pipeline, PipelineConfig, PipelineReport};
use lake_etl::output::WriteMode;
use lake_etl::query::{query_poll_default, QueryRunner};
use lake_etl::transform::PartitionKey;
use lake_etl::{PollConfig, RecordSet, Scalar};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SALES: &str = "\
produto,preco,quantidade,data_venda
caneta,10,3,2024-01-03
caneta,10,3,2024-01-03
lapis,2,,2024-01-04
";

struct Lake {
    _dir: TempDir,
    settings: Settings,
    csv: PathBuf,
}

fn lake() -> Lake {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("vendas.csv");
    std::fs::write(&csv, SALES).unwrap();
    let settings = Settings {
        backend: Backend::Local,
        lake_root: dir.path().join("lake"),
        ..Settings::default()
    };
    Lake {
        _dir: dir,
        settings,
        csv,
    }
}

async fn run(lake: &Lake, date: &str, mode: WriteMode) -> PipelineReport {
    let config = PipelineConfig::new(
        &lake.settings.crawler_name,
        PartitionKey::parse(date).unwrap(),
    )
    .with_write_mode(mode)
    .with_crawler_poll(PollConfig::from_secs(1, 10));
    let pipeline = Pipeline::new(
        config,
        lake.settings.raw_destination().unwrap(),
        lake.settings.processed_destination().unwrap(),
        lake.settings.catalog_service().await,
    );
    pipeline.run(&lake.csv).await.unwrap()
}

async fn query(lake: &Lake, sql: &str) -> RecordSet {
    let runner = QueryRunner::new(lake.settings.query_service().await, query_poll_default());
    runner
        .run_query(
            sql,
            &lake.settings.database,
            &lake.settings.query_results_location(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_csv_to_sql() {
    let lake = lake();
    let report = run(&lake, "2024-01-05", WriteMode::Append).await;

    assert_eq!(report.rows_read, 3);
    assert_eq!(report.upload.rows, 2);
    assert_eq!(report.upload.partitions, vec!["ano=2024/mes=01/dia=05"]);

    let root = &lake.settings.lake_root;
    assert!(root
        .join("seu-bucket-raw-data/raw/vendas/2024/01/05/vendas.csv")
        .is_file());

    let manifest = CatalogManifest::load(&lake.settings.catalog_dir(), "meu_database").unwrap();
    assert_eq!(
        manifest.tables.keys().collect::<Vec<_>>(),
        vec!["vendas"]
    );

    let set = query(
        &lake,
        "SELECT produto, ano, mes, dia FROM vendas ORDER BY produto",
    )
    .await;
    assert_eq!(set.len(), 2);
    assert_eq!(set.get(0, "produto"), Some(&Scalar::from("caneta")));
    assert_eq!(set.get(1, "produto"), Some(&Scalar::from("lapis")));
    assert_eq!(set.get(0, "ano"), Some(&Scalar::from("2024")));
    assert_eq!(set.get(0, "mes"), Some(&Scalar::from("01")));
    assert_eq!(set.get(0, "dia"), Some(&Scalar::from("05")));

    let results = root.join("seu-bucket-athena-results");
    assert_eq!(csv_files(&results), 1);
}

#[tokio::test]
async fn test_append_rerun_duplicates_rows() {
    let lake = lake();
    run(&lake, "2024-01-05", WriteMode::Append).await;
    run(&lake, "2024-01-05", WriteMode::Append).await;

    let set = query(&lake, "SELECT count(*) AS n FROM vendas").await;
    assert_eq!(set.get(0, "n"), Some(&Scalar::Int(4)));
}

#[tokio::test]
async fn test_overwrite_rerun_replaces_partition() {
    let lake = lake();
    run(&lake, "2024-01-05", WriteMode::Overwrite).await;
    let report = run(&lake, "2024-01-05", WriteMode::Overwrite).await;
    assert_eq!(report.upload.files_replaced, 1);

    let set = query(&lake, "SELECT count(*) AS n FROM vendas").await;
    assert_eq!(set.get(0, "n"), Some(&Scalar::Int(2)));
}

#[tokio::test]
async fn test_runs_on_different_days_land_in_separate_partitions() {
    let lake = lake();
    run(&lake, "2024-01-05", WriteMode::Append).await;
    run(&lake, "2024-01-06", WriteMode::Append).await;

    let set = query(
        &lake,
        "SELECT dia, count(*) AS n FROM vendas GROUP BY dia ORDER BY dia",
    )
    .await;
    assert_eq!(set.len(), 2);
    assert_eq!(set.get(0, "dia"), Some(&Scalar::from("05")));
    assert_eq!(set.get(1, "dia"), Some(&Scalar::from("06")));
    assert_eq!(set.get(1, "n"), Some(&Scalar::Int(2)));
}

fn csv_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "csv"))
        .count()
}
