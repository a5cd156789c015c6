//! Local directory crawler
//!
//! A crawl scans a target directory for table directories holding Parquet
//! files and records them in a per-database JSON manifest, which the local
//! query backend reads to register its views.

use super::types::JobState;
use super::CatalogService;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Tables registered for one database: table name -> dataset directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogManifest {
    pub tables: BTreeMap<String, PathBuf>,
}

impl CatalogManifest {
    /// Manifest file for a database
    pub fn path(catalog_dir: &Path, database: &str) -> PathBuf {
        catalog_dir.join(format!("{database}.json"))
    }

    /// Load a database manifest; a missing file is an empty manifest
    pub fn load(catalog_dir: &Path, database: &str) -> Result<Self> {
        let path = Self::path(catalog_dir, database);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Other(format!("Invalid catalog manifest {}: {e}", path.display())))
    }

    /// Write the manifest for a database
    pub fn save(&self, catalog_dir: &Path, database: &str) -> Result<()> {
        std::fs::create_dir_all(catalog_dir)?;
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Other(format!("Failed to serialize catalog manifest: {e}")))?;
        std::fs::write(Self::path(catalog_dir, database), content)?;
        Ok(())
    }
}

/// A registered crawler: where to scan and which database to fill
#[derive(Debug, Clone)]
struct LocalCrawler {
    target: PathBuf,
    database: String,
}

/// Catalog service over the local filesystem
#[derive(Debug)]
pub struct LocalCatalog {
    catalog_dir: PathBuf,
    crawlers: HashMap<String, LocalCrawler>,
    states: Mutex<HashMap<String, JobState>>,
}

impl LocalCatalog {
    /// Create a catalog writing manifests under `catalog_dir`
    pub fn new(catalog_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog_dir: catalog_dir.into(),
            crawlers: HashMap::new(),
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Register a crawler scanning `target` into `database`
    #[must_use]
    pub fn with_crawler(
        mut self,
        name: impl Into<String>,
        target: impl Into<PathBuf>,
        database: impl Into<String>,
    ) -> Self {
        self.crawlers.insert(
            name.into(),
            LocalCrawler {
                target: target.into(),
                database: database.into(),
            },
        );
        self
    }

    fn crawler(&self, name: &str) -> Result<&LocalCrawler> {
        self.crawlers
            .get(name)
            .ok_or_else(|| Error::catalog(name, "crawler does not exist"))
    }
}

#[async_trait]
impl CatalogService for LocalCatalog {
    async fn start_job(&self, name: &str) -> Result<()> {
        let crawler = self.crawler(name)?.clone();
        {
            let mut states = self.states.lock().await;
            if states.get(name) == Some(&JobState::Running) {
                return Err(Error::catalog(name, "crawler is already running"));
            }
            states.insert(name.to_string(), JobState::Running);
        }

        // Blocking scan, run without holding the state lock
        let catalog_dir = self.catalog_dir.clone();
        let database = crawler.database.clone();
        let outcome = tokio::task::spawn_blocking(move || crawl(&catalog_dir, &crawler))
            .await
            .unwrap_or_else(|e| Err(Error::catalog(name, format!("crawl task failed: {e}"))));

        let state = match outcome {
            Ok(found) => {
                info!("Crawler {name} registered {found} tables in database {database}");
                JobState::Succeeded
            }
            Err(e) => {
                warn!("Crawler {name} failed: {e}");
                JobState::Failed
            }
        };
        self.states.lock().await.insert(name.to_string(), state);
        Ok(())
    }

    async fn job_state(&self, name: &str) -> Result<JobState> {
        self.crawler(name)?;
        let states = self.states.lock().await;
        Ok(states.get(name).copied().unwrap_or(JobState::NotStarted))
    }
}

/// Scan a crawler's target and merge what it finds into its database manifest
fn crawl(catalog_dir: &Path, crawler: &LocalCrawler) -> Result<usize> {
    let tables = discover_tables(&crawler.target)?;
    let mut manifest = CatalogManifest::load(catalog_dir, &crawler.database)?;
    let found = tables.len();
    manifest.tables.extend(tables);
    manifest.save(catalog_dir, &crawler.database)?;
    Ok(found)
}

/// Table directories under `target`: each direct child holding Parquet files
pub fn discover_tables(target: &Path) -> Result<BTreeMap<String, PathBuf>> {
    if !target.is_dir() {
        return Err(Error::Other(format!(
            "crawler target {} is not a directory",
            target.display()
        )));
    }
    let root = target.canonicalize()?;

    let mut tables = BTreeMap::new();
    for entry in WalkDir::new(&root).min_depth(2).into_iter().filter_map(|e| e.ok()) {
        let is_parquet = entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "parquet");
        if !is_parquet {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(&root) else {
            continue;
        };
        if let Some(table) = relative.components().next() {
            let name = table.as_os_str().to_string_lossy().to_string();
            tables.entry(name.clone()).or_insert_with(|| root.join(&name));
        }
    }
    Ok(tables)
}
