//! Per-tenant virtual host: configuration-derived value plus the storage
//! gateway operations.
//!
//! A `VHost` is constructed once per tenant at configuration load and is
//! read-only for the rest of its life, so it can be shared freely across
//! request-handling tasks. The full source configuration mapping is retained
//! so a behaviorally equivalent VHost can be rebuilt on a worker from a job
//! envelope.

use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use stowage_core::auth::{self, AuthGuard, AuthParams};
use stowage_core::config::RawConfig;

use crate::backend::{ByteStream, ObjectBackend, StorageError, StorageResult, UrlStyle};
use crate::context::GatewayContext;
use crate::factory::create_backend;
use crate::keys::remote_key;

/// Result of a [`VHost::storage_create`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The blob was uploaded to the backend.
    Uploaded,
    /// The cached blob was gone by the time the job ran; nothing was
    /// uploaded. A legitimate race, not a failure.
    SkippedMissingBlob,
}

pub struct VHost {
    remote_dir: Option<Vec<String>>,
    auth: AuthGuard,
    geometry_whitelist: Option<Vec<String>>,
    hostname: Option<String>,
    signed_url_ttl: Duration,
    clear_outbox_on_upload: bool,
    backend: Option<Arc<dyn ObjectBackend>>,
    backup: Option<Box<VHost>>,
    download_headers: BTreeMap<String, String>,
    upload_headers: BTreeMap<String, String>,
    config: RawConfig,
}

impl VHost {
    /// Build a VHost from a tenant configuration mapping.
    ///
    /// Missing backend configuration is not an error: the VHost is valid but
    /// the storage operations have an unsatisfied precondition and return a
    /// `ConfigError`. A present-but-broken `STORAGE_CONFIG` is fatal here.
    /// When both `STORAGE_CONFIG` and `BACKUP_CONFIG` are present, a nested
    /// backup VHost is built recursively from the derived mapping.
    pub async fn from_config(config: RawConfig) -> StorageResult<Self> {
        let backend = match config.storage_config() {
            Some(storage) => Some(create_backend(storage).await?),
            None => None,
        };

        let backup = match (&backend, config.backup_derived()) {
            (Some(_), Some(derived)) => {
                let nested = Box::pin(VHost::from_config(derived)).await?;
                Some(Box::new(nested))
            }
            _ => None,
        };

        Ok(Self::assemble(config, backend, backup))
    }

    /// Build a VHost around an explicitly supplied backend handle.
    ///
    /// For embedders with their own [`ObjectBackend`] implementation; the
    /// `STORAGE_CONFIG` mapping is not consulted for backend construction but
    /// the rest of the mapping (remote dir, secret, headers, TTL) applies as
    /// usual.
    pub fn with_backend(
        config: RawConfig,
        backend: Arc<dyn ObjectBackend>,
        backup: Option<Box<VHost>>,
    ) -> Self {
        Self::assemble(config, Some(backend), backup)
    }

    fn assemble(
        config: RawConfig,
        backend: Option<Arc<dyn ObjectBackend>>,
        backup: Option<Box<VHost>>,
    ) -> Self {
        Self {
            remote_dir: config.remote_dir(),
            auth: AuthGuard::new(config.secret_key().map(String::from)),
            geometry_whitelist: config.geometry_whitelist(),
            hostname: config.hostname().map(String::from),
            signed_url_ttl: config.signed_url_ttl(),
            clear_outbox_on_upload: config.clear_outbox_on_upload(),
            backend,
            backup,
            download_headers: config.download_headers(),
            upload_headers: config.upload_headers(),
            config,
        }
    }

    pub fn remote_dir(&self) -> Option<&[String]> {
        self.remote_dir.as_deref()
    }

    pub fn geometry_whitelist(&self) -> Option<&[String]> {
        self.geometry_whitelist.as_deref()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub fn signed_url_ttl(&self) -> Duration {
        self.signed_url_ttl
    }

    pub fn bucket(&self) -> Option<&str> {
        self.backend.as_deref().map(ObjectBackend::bucket)
    }

    pub fn backup(&self) -> Option<&VHost> {
        self.backup.as_deref()
    }

    pub fn download_headers(&self) -> &BTreeMap<String, String> {
        &self.download_headers
    }

    pub fn upload_headers(&self) -> &BTreeMap<String, String> {
        &self.upload_headers
    }

    /// The full source configuration mapping, retained verbatim for async
    /// dispatch and reconstruction.
    pub fn config(&self) -> &RawConfig {
        &self.config
    }

    /// Backend object key for a tenant-relative path.
    pub fn remote_key(&self, relpath: &str) -> String {
        remote_key(self.remote_dir.as_deref(), relpath)
    }

    fn backend(&self) -> StorageResult<&Arc<dyn ObjectBackend>> {
        self.backend.as_ref().ok_or_else(|| {
            StorageError::ConfigError("tenant has no storage backend configured".to_string())
        })
    }

    pub fn authorized(&self, params: &AuthParams) -> bool {
        self.auth.authorized(params)
    }

    /// Signature guard for this tenant, for signing-side use.
    pub fn auth(&self) -> &AuthGuard {
        &self.auth
    }

    /// The canonical 401 response for this tenant.
    pub fn unauthorized(&self) -> http::Response<()> {
        auth::unauthorized(&self.upload_headers)
    }

    /// URL for an object: time-limited when the backend signs URLs, the
    /// permanent public URL otherwise.
    pub async fn storage_url(&self, relpath: &str) -> StorageResult<String> {
        let backend = self.backend()?;
        let key = self.remote_key(relpath);

        let url = match backend.url_style() {
            UrlStyle::Signed => backend.signed_url(&key, self.signed_url_ttl).await?,
            UrlStyle::Public => backend.public_url(&key),
        };

        tracing::info!(url = %url, "storage_url");
        Ok(url)
    }

    /// Streaming fetch of an object's bytes.
    pub async fn storage_get(&self, relpath: &str) -> StorageResult<ByteStream> {
        let backend = self.backend()?;
        let key = self.remote_key(relpath);
        backend.get_stream(&key).await
    }

    /// Upload the cached blob at `cache_key` to this tenant's key for
    /// `relpath`. A cache miss means the blob was deleted between enqueue and
    /// execution; the upload is skipped without error. On success the
    /// pending-upload outbox entry is cleared when a hostname and an outbox
    /// are configured.
    pub async fn storage_create(
        &self,
        relpath: &str,
        cache_key: &str,
        ctx: &GatewayContext,
    ) -> StorageResult<CreateOutcome> {
        let backend = self.backend()?;
        tracing::info!(cache_key = %cache_key, relpath = %relpath, "uploading");

        let body: Bytes = match ctx.cache.read(cache_key).await {
            Ok(body) => body,
            Err(StorageError::NotFound(_)) => {
                // blob no longer exists; likely deleted right after upload
                tracing::info!(cache_key = %cache_key, "cached blob gone, skipping upload");
                return Ok(CreateOutcome::SkippedMissingBlob);
            }
            Err(e) => return Err(e),
        };

        let key = self.remote_key(relpath);
        backend.put(&key, body).await?;

        if self.clear_outbox_on_upload {
            if let (Some(hostname), Some(outbox)) = (self.hostname.as_deref(), ctx.outbox.as_deref())
            {
                outbox.delete(hostname, relpath).await?;
            }
        }

        tracing::info!(cache_key = %cache_key, key = %key, "uploaded");
        Ok(CreateOutcome::Uploaded)
    }

    /// Delete the object for `relpath`. Behavior for an already-absent key is
    /// the backend's own; errors propagate unmodified.
    pub async fn storage_destroy(&self, relpath: &str) -> StorageResult<()> {
        let backend = self.backend()?;
        let key = self.remote_key(relpath);

        tracing::info!(relpath = %relpath, key = %key, "deleting");
        backend.delete(&key).await?;
        tracing::info!(relpath = %relpath, key = %key, "deleted");
        Ok(())
    }

    /// Replicate an uploaded object to the backup bucket under the identical
    /// key. No-op when no backup is configured. Callers invoke this after a
    /// successful create; it is never triggered automatically.
    pub async fn backup_file(&self, relpath: &str) -> StorageResult<()> {
        let Some(backup) = self.backup.as_deref() else {
            return Ok(());
        };

        let backend = self.backend()?;
        let dst_bucket = backup.backend()?.bucket().to_string();
        let key = self.remote_key(relpath);

        backend
            .copy_object(backend.bucket(), &key, &dst_bucket, &key)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cfg(value: serde_json::Value) -> RawConfig {
        RawConfig::new(value.as_object().cloned().unwrap_or_default())
    }

    #[tokio::test]
    async fn vhost_without_storage_config_is_valid() {
        let vhost = VHost::from_config(cfg(json!({"SECRET_KEY": "s"}))).await.unwrap();
        assert!(vhost.bucket().is_none());
        assert!(vhost.backup().is_none());

        // storage operations hit the documented precondition
        assert!(matches!(
            vhost.storage_url("a.png").await,
            Err(StorageError::ConfigError(_))
        ));
        assert!(matches!(
            vhost.storage_destroy("a.png").await,
            Err(StorageError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn broken_storage_config_is_fatal() {
        let config = cfg(json!({"STORAGE_CONFIG": {"provider": "s3"}}));
        assert!(matches!(
            VHost::from_config(config).await,
            Err(StorageError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn header_maps_carry_defaults_and_overrides() {
        let vhost = VHost::from_config(cfg(json!({
            "DOWNLOAD_HEADERS": {"Cache-Control": "private"},
            "UPLOAD_HEADERS": {"Access-Control-Allow-Origin": "https://example.com"}
        })))
        .await
        .unwrap();

        assert_eq!(vhost.download_headers().get("Cache-Control").unwrap(), "private");
        assert_eq!(
            vhost.upload_headers().get("Access-Control-Allow-Origin").unwrap(),
            "https://example.com"
        );
        assert_eq!(
            vhost.upload_headers().get("Access-Control-Allow-Methods").unwrap(),
            "POST, PUT"
        );
    }

    #[tokio::test]
    async fn unauthorized_response_uses_tenant_cors_map() {
        let vhost = VHost::from_config(cfg(json!({
            "UPLOAD_HEADERS": {"Access-Control-Allow-Origin": "https://example.com"}
        })))
        .await
        .unwrap();

        let response = vhost.unauthorized();
        assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("Access-Control-Allow-Origin").unwrap(),
            "https://example.com"
        );
        assert_eq!(
            response.headers().get("X-Exception").unwrap(),
            "Authorization failed"
        );
    }

    #[cfg(feature = "storage-local")]
    #[tokio::test]
    async fn backup_vhost_is_built_from_derived_config() {
        let dir = tempfile::tempdir().unwrap();
        let vhost = VHost::from_config(cfg(json!({
            "REMOTE_DIR": "tenantA",
            "STORAGE_CONFIG": {
                "provider": "local",
                "bucket": "primary",
                "base_path": dir.path().to_str().unwrap(),
                "base_url": "http://localhost:3000/files"
            },
            "BACKUP_CONFIG": {"bucket": "backup"}
        })))
        .await
        .unwrap();

        assert_eq!(vhost.bucket(), Some("primary"));
        let backup = vhost.backup().unwrap();
        assert_eq!(backup.bucket(), Some("backup"));
        // backup shares the namespace rule and never nests further
        assert_eq!(backup.remote_dir(), vhost.remote_dir());
        assert!(backup.backup().is_none());
    }
}
