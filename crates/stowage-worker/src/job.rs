//! Typed storage jobs and the dispatch envelope.
//!
//! The dispatchable operation set is closed: workers match on the variant
//! rather than resolving a method name. Each variant carries its own typed
//! payload.

use serde::{Deserialize, Serialize};
use stowage_core::RawConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StorageJob {
    /// Upload the cached blob at `cache_key` to the tenant key for `relpath`.
    Create { relpath: String, cache_key: String },
    /// Delete the object at the tenant key for `relpath`.
    Destroy { relpath: String },
}

impl StorageJob {
    pub fn relpath(&self) -> &str {
        match self {
            StorageJob::Create { relpath, .. } => relpath,
            StorageJob::Destroy { relpath } => relpath,
        }
    }

    /// Short operation name for logging.
    pub fn op(&self) -> &'static str {
        match self {
            StorageJob::Create { .. } => "create",
            StorageJob::Destroy { .. } => "destroy",
        }
    }
}

/// A job plus the tenant configuration snapshot it must run against. The
/// snapshot travels with the job because the worker may execute in a
/// different process than the triggering request; VHost instances are never
/// assumed shareable across that boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub config: RawConfig,
    pub job: StorageJob,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_round_trips_through_json() {
        let envelope = JobEnvelope {
            config: RawConfig::new(
                json!({"REMOTE_DIR": "tenantA", "SECRET_KEY": "s"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            ),
            job: StorageJob::Create {
                relpath: "img/1.png".to_string(),
                cache_key: "k1".to_string(),
            },
        };

        let raw = serde_json::to_string(&envelope).unwrap();
        let back: JobEnvelope = serde_json::from_str(&raw).unwrap();
        assert_eq!(envelope, back);
    }

    #[test]
    fn job_variants_are_tagged_by_op() {
        let raw = serde_json::to_value(StorageJob::Destroy {
            relpath: "a.png".to_string(),
        })
        .unwrap();
        assert_eq!(raw, json!({"op": "destroy", "relpath": "a.png"}));
    }
}
