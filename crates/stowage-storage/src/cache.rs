//! Local blob-cache collaborator.
//!
//! Upload jobs read the blob to push from this cache by an opaque cache key.
//! A missing entry is a distinct condition, not a failure: the blob may have
//! been deleted between enqueue and execution.

use crate::backend::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;

/// Read-side capability of the local blob cache.
#[async_trait]
pub trait BlobCache: Send + Sync {
    /// Read a cached blob. Returns [`StorageError::NotFound`] when the entry
    /// is absent.
    async fn read(&self, cache_key: &str) -> StorageResult<Bytes>;
}

/// Disk-backed blob cache rooted at a directory; cache keys are relative
/// file paths.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entry_path(&self, cache_key: &str) -> StorageResult<PathBuf> {
        if cache_key.contains("..") || cache_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Cache key contains invalid characters".to_string(),
            ));
        }
        Ok(self.root.join(cache_key))
    }
}

#[async_trait]
impl BlobCache for DiskCache {
    async fn read(&self, cache_key: &str) -> StorageResult<Bytes> {
        let path = self.entry_path(cache_key)?;

        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(cache_key.to_string()))
            }
            Err(e) => Err(StorageError::from(e)),
        }
    }
}
