#[cfg(feature = "storage-local")]
use crate::LocalBackend;
#[cfg(feature = "storage-s3")]
use crate::S3Backend;
use crate::{ObjectBackend, StorageError, StorageResult};
use serde_json::{Map, Value};
use std::sync::Arc;

fn required<'a>(config: &'a Map<String, Value>, key: &str) -> StorageResult<&'a str> {
    config
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| StorageError::ConfigError(format!("STORAGE_CONFIG is missing '{key}'")))
}

/// Create a backend handle from a tenant's `STORAGE_CONFIG` mapping.
///
/// Recognized keys: `provider` (`"s3"` default, or `"local"`), `bucket`
/// (always required), `region`/`endpoint` for S3, `base_path`/`base_url` for
/// the local backend.
pub async fn create_backend(config: &Map<String, Value>) -> StorageResult<Arc<dyn ObjectBackend>> {
    let provider = config
        .get("provider")
        .and_then(Value::as_str)
        .unwrap_or("s3");
    let bucket = required(config, "bucket")?;

    match provider {
        #[cfg(feature = "storage-s3")]
        "s3" => {
            let region = required(config, "region")?;
            let endpoint = config
                .get("endpoint")
                .and_then(Value::as_str)
                .map(String::from);

            let backend = S3Backend::new(bucket.to_string(), region.to_string(), endpoint)?;
            Ok(Arc::new(backend))
        }

        #[cfg(not(feature = "storage-s3"))]
        "s3" => Err(StorageError::ConfigError(
            "S3 backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        "local" => {
            let base_path = required(config, "base_path")?;
            let base_url = required(config, "base_url")?;

            let backend =
                LocalBackend::new(base_path, base_url.to_string(), bucket.to_string()).await?;
            Ok(Arc::new(backend))
        }

        #[cfg(not(feature = "storage-local"))]
        "local" => Err(StorageError::ConfigError(
            "Local backend not available (storage-local feature not enabled)".to_string(),
        )),

        other => Err(StorageError::ConfigError(format!(
            "Unknown storage provider '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_bucket_is_a_config_error() {
        let config = json!({"provider": "s3", "region": "us-east-1"});
        let err = create_backend(config.as_object().unwrap()).await.unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
    }

    #[tokio::test]
    async fn unknown_provider_is_a_config_error() {
        let config = json!({"provider": "tape", "bucket": "b"});
        let err = create_backend(config.as_object().unwrap()).await.unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
    }

    #[cfg(feature = "storage-local")]
    #[tokio::test]
    async fn local_provider_builds_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = json!({
            "provider": "local",
            "bucket": "files",
            "base_path": dir.path().to_str().unwrap(),
            "base_url": "http://localhost:3000/files"
        });
        let backend = create_backend(config.as_object().unwrap()).await.unwrap();
        assert_eq!(backend.bucket(), "files");
    }
}
