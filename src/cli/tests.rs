//! Tests for cli module

use super::*;
use crate::config::Backend;
use crate::output::{ExportFormat, ParquetCodec, WriteMode};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_run_defaults() {
    let cli = Cli::try_parse_from(["lake-etl", "run", "--csv-file", "vendas.csv"]).unwrap();
    let Commands::Run(args) = cli.command else {
        panic!("expected run");
    };
    assert_eq!(args.csv_file, PathBuf::from("vendas.csv"));
    assert_eq!(args.write_mode, WriteMode::Append);
    assert_eq!(args.delimiter, ',');
    assert_eq!(args.crawler_poll_secs, 30);
    assert_eq!(args.crawler_timeout_secs, 600);
    assert_eq!(args.compression, ParquetCodec::Snappy);
    assert!(args.query.is_none());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "lake-etl",
        "query",
        "--query",
        "SELECT 1",
        "--backend",
        "local",
        "--lake-root",
        "/tmp/lake",
        "-v",
    ])
    .unwrap();
    assert_eq!(cli.backend, Backend::Local);
    assert_eq!(cli.lake_root, PathBuf::from("/tmp/lake"));
    assert!(cli.verbose);

    let settings = Runner::new(cli).settings();
    assert_eq!(settings.backend, Backend::Local);
    assert_eq!(settings.lake_root, PathBuf::from("/tmp/lake"));
}

#[test]
fn test_query_args() {
    let cli = Cli::try_parse_from([
        "lake-etl",
        "query",
        "--query-file",
        "consulta.sql",
        "--output-file",
        "out.parquet",
        "--format",
        "parquet",
        "--async",
    ])
    .unwrap();
    let Commands::Query(args) = cli.command else {
        panic!("expected query");
    };
    assert_eq!(args.query_file, Some(PathBuf::from("consulta.sql")));
    assert_eq!(args.format, ExportFormat::Parquet);
    assert!(args.no_wait);
    assert_eq!(args.poll_secs, 1);
    assert_eq!(args.timeout_secs, 100);
}

#[test]
fn test_query_requires_exactly_one_source() {
    assert!(Cli::try_parse_from(["lake-etl", "query"]).is_err());
    assert!(Cli::try_parse_from([
        "lake-etl",
        "query",
        "--query",
        "SELECT 1",
        "--query-id",
        "abc"
    ])
    .is_err());
}

#[test]
fn test_run_requires_csv_file() {
    assert!(Cli::try_parse_from(["lake-etl", "run"]).is_err());
}
