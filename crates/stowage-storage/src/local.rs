use crate::backend::{ByteStream, ObjectBackend, StorageError, StorageResult, UrlStyle};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

/// Local filesystem object backend
///
/// Buckets are subdirectories of `base_path`; objects are plain files. Public
/// URLs only — this backend cannot issue signed URLs.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    base_path: PathBuf,
    base_url: String,
    bucket: String,
}

impl LocalBackend {
    /// Create a new LocalBackend instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory holding bucket subdirectories
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3000/files")
    /// * `bucket` - Bucket name, i.e. the subdirectory this handle is scoped to
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        bucket: String,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(base_path.join(&bucket)).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.join(&bucket).display(),
                e
            ))
        })?;

        Ok(LocalBackend {
            base_path,
            base_url,
            bucket,
        })
    }

    /// Convert a (bucket, key) pair to a filesystem path with traversal
    /// validation: keys must not contain `..` or a leading `/`.
    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        for part in [bucket, key] {
            if part.contains("..") || part.starts_with('/') {
                return Err(StorageError::InvalidKey(
                    "Object key contains invalid characters".to_string(),
                ));
            }
        }
        Ok(self.base_path.join(bucket).join(key))
    }

    fn generate_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.bucket,
            key
        )
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectBackend for LocalBackend {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn url_style(&self) -> UrlStyle {
        UrlStyle::Public
    }

    async fn signed_url(&self, _key: &str, _expires_in: Duration) -> StorageResult<String> {
        Err(StorageError::ConfigError(
            "local backend does not issue signed URLs".to_string(),
        ))
    }

    fn public_url(&self, key: &str) -> String {
        self.generate_url(key)
    }

    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        let path = self.object_path(&self.bucket, key)?;
        let size = data.len();

        Self::ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream> {
        let path = self.object_path(&self.bucket, key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let stream = ReaderStream::new(file).map(|res| res.map_err(StorageError::from));
        Ok(Box::pin(stream))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.object_path(&self.bucket, key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> StorageResult<()> {
        let from = self.object_path(src_bucket, src_key)?;
        let to = self.object_path(dst_bucket, dst_key)?;

        if !fs::try_exists(&from).await.unwrap_or(false) {
            return Err(StorageError::NotFound(src_key.to_string()));
        }

        Self::ensure_parent_dir(&to).await?;

        fs::copy(&from, &to).await.map_err(|e| {
            StorageError::CopyFailed(format!(
                "Failed to copy {} to {}: {}",
                from.display(),
                to.display(),
                e
            ))
        })?;

        tracing::info!(
            src_bucket = %src_bucket,
            src_key = %src_key,
            dst_bucket = %dst_bucket,
            dst_key = %dst_key,
            "Local storage copy successful"
        );

        Ok(())
    }
}
