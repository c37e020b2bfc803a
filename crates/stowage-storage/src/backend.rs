//! Object-storage capability trait
//!
//! This module defines the `ObjectBackend` trait that all storage backends
//! must implement, plus the shared error taxonomy.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Copy failed: {0}")]
    CopyFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Streaming object body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// How a backend produces object URLs. Selected once when the backend handle
/// is constructed; the gateway never probes per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlStyle {
    /// The backend can issue time-limited signed URLs.
    Signed,
    /// The backend only exposes permanent public URLs.
    Public,
}

/// Object-storage capability required of a backend collaborator.
///
/// Handles are bucket-scoped, key-addressed, and safe for concurrent use.
/// Backend failures (network, permissions, missing keys on delete) propagate
/// unmodified; this layer never masks them.
#[async_trait]
pub trait ObjectBackend: Send + Sync + std::fmt::Debug {
    /// The bucket this handle is scoped to.
    fn bucket(&self) -> &str;

    fn url_style(&self) -> UrlStyle;

    /// Time-limited URL for `key`. Only meaningful for [`UrlStyle::Signed`]
    /// backends; others return a `ConfigError`.
    async fn signed_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Permanent public URL for `key`.
    fn public_url(&self, key: &str) -> String;

    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream>;

    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Copy `(src_bucket, src_key)` to `(dst_bucket, dst_key)` within this
    /// backend's storage account. The transfer mechanism is a backend detail.
    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> StorageResult<()>;
}
