//! Runtime settings
//!
//! Bucket, crawler and database names are read once at start (CLI flags,
//! then environment variables, then the defaults below) and folded into an
//! immutable [`Settings`] that is passed explicitly to every component.

use crate::catalog::{CatalogService, GlueCatalog, LocalCatalog};
use crate::error::Result;
use crate::output::CloudDestination;
use crate::query::{AthenaQueryService, DuckDbQueryService, QueryService};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default bucket for raw source files
pub const DEFAULT_RAW_BUCKET: &str = "seu-bucket-raw-data";

/// Default bucket for Parquet output
pub const DEFAULT_PROCESSED_BUCKET: &str = "seu-bucket-processed-data";

/// Default Glue crawler
pub const DEFAULT_CRAWLER_NAME: &str = "meu-crawler-parquet";

/// Default Glue database
pub const DEFAULT_DATABASE: &str = "meu_database";

/// Default Athena results location
pub const DEFAULT_RESULTS_LOCATION: &str = "s3://seu-bucket-athena-results/";

/// Default root directory of the local backend
pub const DEFAULT_LAKE_ROOT: &str = "./lake";

/// Prefix under the processed bucket holding one directory per dataset
pub const PROCESSED_ROOT: &str = "processed";

/// Service backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// S3 + Glue + Athena
    #[default]
    Aws,
    /// Local directories + directory crawler + DuckDB
    Local,
}

/// Immutable settings for one process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend: Backend,
    pub region: Option<String>,
    pub raw_bucket: String,
    pub processed_bucket: String,
    pub crawler_name: String,
    pub database: String,
    pub results_location: String,
    /// Root directory standing in for S3 with the local backend
    pub lake_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            region: None,
            raw_bucket: DEFAULT_RAW_BUCKET.to_string(),
            processed_bucket: DEFAULT_PROCESSED_BUCKET.to_string(),
            crawler_name: DEFAULT_CRAWLER_NAME.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            results_location: DEFAULT_RESULTS_LOCATION.to_string(),
            lake_root: PathBuf::from(DEFAULT_LAKE_ROOT),
        }
    }
}

impl Settings {
    /// Load `.env` from the working directory or its parents, if present
    pub fn load_dotenv() -> Option<PathBuf> {
        dotenvy::dotenv().ok()
    }

    /// Map a location to the active backend
    ///
    /// With the local backend, `s3://bucket/prefix` and bare bucket names
    /// become directories under `lake_root`; local paths are kept.
    pub fn resolve_location(&self, location: &str) -> String {
        if self.backend == Backend::Aws {
            return location.to_string();
        }
        if let Some(path) = location.strip_prefix("file://") {
            return path.to_string();
        }
        let bucket_path = location.strip_prefix("s3://").or_else(|| {
            let is_path = location.starts_with('.')
                || Path::new(location).is_absolute()
                || location.contains(std::path::MAIN_SEPARATOR);
            (!is_path).then_some(location)
        });
        match bucket_path {
            Some(bucket_path) => self
                .lake_root
                .join(bucket_path.trim_matches('/'))
                .display()
                .to_string(),
            None => location.to_string(),
        }
    }

    /// Directory holding local catalog manifests
    pub fn catalog_dir(&self) -> PathBuf {
        self.lake_root.join("_catalog")
    }

    /// Destination for raw files
    pub fn raw_destination(&self) -> Result<CloudDestination> {
        CloudDestination::parse(
            &self.resolve_location(&self.raw_bucket),
            self.region.as_deref(),
        )
    }

    /// Destination for Parquet datasets
    pub fn processed_destination(&self) -> Result<CloudDestination> {
        CloudDestination::parse(
            &self.resolve_location(&self.processed_bucket),
            self.region.as_deref(),
        )
    }

    /// Results location as given to the query service
    pub fn query_results_location(&self) -> String {
        self.resolve_location(&self.results_location)
    }

    /// Catalog service for the active backend
    pub async fn catalog_service(&self) -> Arc<dyn CatalogService> {
        match self.backend {
            Backend::Aws => Arc::new(GlueCatalog::from_env(self.region.as_deref()).await),
            Backend::Local => {
                let target =
                    Path::new(&self.resolve_location(&self.processed_bucket)).join(PROCESSED_ROOT);
                Arc::new(LocalCatalog::new(self.catalog_dir()).with_crawler(
                    &self.crawler_name,
                    target,
                    &self.database,
                ))
            }
        }
    }

    /// Query service for the active backend
    pub async fn query_service(&self) -> Arc<dyn QueryService> {
        match self.backend {
            Backend::Aws => Arc::new(AthenaQueryService::from_env(self.region.as_deref()).await),
            Backend::Local => Arc::new(DuckDbQueryService::new(self.catalog_dir())),
        }
    }
}
