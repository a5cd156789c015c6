//! Object storage destinations (S3 and local filesystem)

use crate::error::{Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::fmt;
use std::sync::Arc;

/// A writable storage location: an object store plus a key prefix
#[derive(Debug, Clone)]
pub struct CloudDestination {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Bucket (or local root) for display
    root: String,
    /// Key prefix within the bucket
    prefix: String,
    /// URL scheme (s3, file, memory)
    scheme: String,
}

impl CloudDestination {
    /// Parse a location and create the matching object store
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3
    /// - `bucket-name` - bare bucket name, treated as S3
    /// - `file:///local/path/`, `/local/path/` or `./path/` - Local filesystem
    pub fn parse(location: &str, region: Option<&str>) -> Result<Self> {
        if let Some(rest) = location.strip_prefix("s3://") {
            Self::parse_s3(rest, region)
        } else if let Some(path) = location.strip_prefix("file://") {
            Self::parse_local(path)
        } else if is_local_path(location) {
            Self::parse_local(location)
        } else {
            Self::parse_s3(location, region)
        }
    }

    /// Wrap an existing store
    pub fn from_store(store: Arc<dyn ObjectStore>, scheme: &str, root: &str) -> Self {
        Self {
            store,
            root: root.to_string(),
            prefix: String::new(),
            scheme: scheme.to_string(),
        }
    }

    /// Parse `bucket/prefix`
    fn parse_s3(without_scheme: &str, region: Option<&str>) -> Result<Self> {
        let (bucket, prefix) = match without_scheme.find('/') {
            Some(idx) => (
                &without_scheme[..idx],
                without_scheme[idx + 1..].trim_matches('/').to_string(),
            ),
            None => (without_scheme, String::new()),
        };
        if bucket.is_empty() {
            return Err(Error::config(format!(
                "Invalid S3 location: s3://{without_scheme}"
            )));
        }

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
        if let Some(region) = region {
            builder = builder.with_region(region);
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create S3 client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            root: bucket.to_string(),
            prefix,
            scheme: "s3".to_string(),
        })
    }

    /// Parse local filesystem path
    fn parse_local(path: &str) -> Result<Self> {
        // Create directory if it doesn't exist
        std::fs::create_dir_all(path)
            .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            root: path.trim_end_matches('/').to_string(),
            prefix: String::new(),
            scheme: "file".to_string(),
        })
    }

    /// Same store, with `segment` appended to the prefix
    #[must_use]
    pub fn child(&self, segment: &str) -> Self {
        let mut child = self.clone();
        child.prefix = self.key(segment.trim_matches('/'));
        child
    }

    /// Full key for a name under this destination
    fn key(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else if name.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}/{name}", self.prefix)
        }
    }

    /// Display URL for a key
    fn url_for(&self, key: &str) -> String {
        if key.is_empty() {
            format!("{}://{}", self.scheme, self.root)
        } else {
            format!("{}://{}/{key}", self.scheme, self.root)
        }
    }

    /// Write bytes under this destination, returning the full URL
    pub async fn write(&self, name: &str, data: Bytes) -> Result<String> {
        let key = self.key(name);
        let url = self.url_for(&key);

        self.store
            .put(&ObjectPath::from(key.as_str()), data.into())
            .await
            .map_err(|e| Error::storage_write(&url, e.to_string()))?;

        Ok(url)
    }

    /// List object keys (relative to this destination) under `sub`
    pub async fn list(&self, sub: &str) -> Result<Vec<String>> {
        let key = self.key(sub);
        let prefix = ObjectPath::from(key.as_str());
        let metas: Vec<_> = self
            .store
            .list(Some(&prefix))
            .try_collect()
            .await
            .map_err(|e| Error::Other(format!("Failed to list {}: {e}", self.url_for(&key))))?;

        let base = if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        };
        let mut keys: Vec<String> = metas
            .into_iter()
            .map(|m| {
                let location = m.location.to_string();
                location
                    .strip_prefix(&base)
                    .map_or(location.clone(), ToString::to_string)
            })
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Delete every object under `sub`, returning how many were removed
    pub async fn delete_prefix(&self, sub: &str) -> Result<usize> {
        let keys = self.list(sub).await?;
        for key in &keys {
            let full = self.key(key);
            self.store
                .delete(&ObjectPath::from(full.as_str()))
                .await
                .map_err(|e| Error::storage_write(self.url_for(&full), e.to_string()))?;
        }
        Ok(keys.len())
    }
}

// Read-back helpers for tests
#[cfg(test)]
impl CloudDestination {
    /// Get the scheme (s3, file, memory)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Key prefix within the bucket
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Read an object under this destination
    pub async fn read(&self, name: &str) -> Result<Bytes> {
        let key = self.key(name);
        let result = self
            .store
            .get(&ObjectPath::from(key.as_str()))
            .await
            .map_err(|e| Error::Other(format!("Failed to read {}: {e}", self.url_for(&key))))?;
        result
            .bytes()
            .await
            .map_err(|e| Error::Other(format!("Failed to read {}: {e}", self.url_for(&key))))
    }
}

impl fmt::Display for CloudDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url_for(&self.prefix))
    }
}

fn is_local_path(location: &str) -> bool {
    location.starts_with('/')
        || location.starts_with("./")
        || location.starts_with("../")
        || location == "."
        || location.contains(std::path::MAIN_SEPARATOR) && !location.contains("://")
}
