//! Tenant configuration mapping.
//!
//! A tenant ("virtual host") is described by a flat string-keyed JSON mapping.
//! [`RawConfig`] wraps that mapping and provides nil-safe typed accessors; the
//! mapping itself is retained verbatim on the constructed VHost so it can be
//! serialized into a job envelope and used to rebuild an equivalent VHost on
//! a worker.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::headers;

pub const REMOTE_DIR: &str = "REMOTE_DIR";
pub const SECRET_KEY: &str = "SECRET_KEY";
pub const GEOMETRY_WHITELIST: &str = "GEOMETRY_WHITELIST";
pub const STORAGE_CONFIG: &str = "STORAGE_CONFIG";
pub const BACKUP_CONFIG: &str = "BACKUP_CONFIG";
pub const DOWNLOAD_HEADERS: &str = "DOWNLOAD_HEADERS";
pub const UPLOAD_HEADERS: &str = "UPLOAD_HEADERS";
pub const HOSTNAME: &str = "HOSTNAME";
pub const SIGNED_URL_TTL: &str = "SIGNED_URL_TTL";
pub const CLEAR_OUTBOX_ON_UPLOAD: &str = "CLEAR_OUTBOX_ON_UPLOAD";

const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 600;

/// Flat per-tenant configuration mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawConfig(Map<String, Value>);

impl RawConfig {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn empty() -> Self {
        Self(Map::new())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    fn str_value(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Key prefix under which this tenant's objects are namespaced. A plain
    /// string is a single segment; an array is an ordered segment sequence.
    /// Absent means keys are root-relative.
    pub fn remote_dir(&self) -> Option<Vec<String>> {
        match self.0.get(REMOTE_DIR)? {
            Value::String(s) if !s.is_empty() => Some(vec![s.clone()]),
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Shared signing secret. Absent or blank disables authorization entirely.
    pub fn secret_key(&self) -> Option<&str> {
        self.str_value(SECRET_KEY)
    }

    /// Allowed image-transform parameters. Consumed by collaborators outside
    /// this core; carried through unchanged.
    pub fn geometry_whitelist(&self) -> Option<Vec<String>> {
        Some(
            self.0
                .get(GEOMETRY_WHITELIST)?
                .as_array()?
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn hostname(&self) -> Option<&str> {
        self.str_value(HOSTNAME)
    }

    /// Backend connection parameters, including `bucket`.
    pub fn storage_config(&self) -> Option<&Map<String, Value>> {
        self.0.get(STORAGE_CONFIG)?.as_object()
    }

    /// Backup-specific overrides for the backend connection parameters.
    pub fn backup_config(&self) -> Option<&Map<String, Value>> {
        self.0.get(BACKUP_CONFIG)?.as_object()
    }

    pub fn download_headers(&self) -> BTreeMap<String, String> {
        headers::merged(
            headers::download_defaults(),
            self.0.get(DOWNLOAD_HEADERS).and_then(Value::as_object),
        )
    }

    pub fn upload_headers(&self) -> BTreeMap<String, String> {
        headers::merged(
            headers::cors_defaults(),
            self.0.get(UPLOAD_HEADERS).and_then(Value::as_object),
        )
    }

    /// Expiry window for signed URLs. Accepts an integer or a numeric string.
    pub fn signed_url_ttl(&self) -> Duration {
        let secs = match self.0.get(SIGNED_URL_TTL) {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        };
        Duration::from_secs(secs.unwrap_or(DEFAULT_SIGNED_URL_TTL_SECS))
    }

    /// Whether a successful upload clears the pending-upload outbox entry.
    pub fn clear_outbox_on_upload(&self) -> bool {
        self.0
            .get(CLEAR_OUTBOX_ON_UPLOAD)
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// Derived mapping for the backup tenant: this mapping minus
    /// `BACKUP_CONFIG`, with `STORAGE_CONFIG` replaced by the primary storage
    /// config merged with the backup overrides (override wins on collision).
    ///
    /// The result is always a fresh copy, never aliasing this mapping, so the
    /// backup VHost has an independent lifecycle. Returns `None` unless both
    /// `STORAGE_CONFIG` and `BACKUP_CONFIG` are present.
    pub fn backup_derived(&self) -> Option<RawConfig> {
        let storage = self.storage_config()?;
        let overrides = self.backup_config()?;

        let mut merged_storage = storage.clone();
        for (key, value) in overrides {
            merged_storage.insert(key.clone(), value.clone());
        }

        let mut derived = self.0.clone();
        derived.remove(BACKUP_CONFIG);
        derived.insert(STORAGE_CONFIG.to_string(), Value::Object(merged_storage));
        Some(RawConfig(derived))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cfg(value: Value) -> RawConfig {
        RawConfig::new(value.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn remote_dir_accepts_string_or_array() {
        let c = cfg(json!({"REMOTE_DIR": "tenantA"}));
        assert_eq!(c.remote_dir(), Some(vec!["tenantA".to_string()]));

        let c = cfg(json!({"REMOTE_DIR": ["tenantA", "uploads"]}));
        assert_eq!(
            c.remote_dir(),
            Some(vec!["tenantA".to_string(), "uploads".to_string()])
        );

        assert_eq!(cfg(json!({})).remote_dir(), None);
    }

    #[test]
    fn blank_secret_treated_as_absent() {
        assert_eq!(cfg(json!({"SECRET_KEY": ""})).secret_key(), None);
        assert_eq!(cfg(json!({"SECRET_KEY": "s3cr3t"})).secret_key(), Some("s3cr3t"));
    }

    #[test]
    fn signed_url_ttl_defaults_and_overrides() {
        assert_eq!(cfg(json!({})).signed_url_ttl(), Duration::from_secs(600));
        assert_eq!(
            cfg(json!({"SIGNED_URL_TTL": 60})).signed_url_ttl(),
            Duration::from_secs(60)
        );
        assert_eq!(
            cfg(json!({"SIGNED_URL_TTL": "120"})).signed_url_ttl(),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn clear_outbox_defaults_true() {
        assert!(cfg(json!({})).clear_outbox_on_upload());
        assert!(!cfg(json!({"CLEAR_OUTBOX_ON_UPLOAD": false})).clear_outbox_on_upload());
    }

    #[test]
    fn backup_derived_merges_storage_with_overrides() {
        let c = cfg(json!({
            "REMOTE_DIR": "tenantA",
            "STORAGE_CONFIG": {"provider": "s3", "bucket": "primary", "region": "us-east-1"},
            "BACKUP_CONFIG": {"bucket": "backup"}
        }));

        let derived = c.backup_derived().unwrap();
        let storage = derived.storage_config().unwrap();
        assert_eq!(storage.get("bucket").unwrap(), "backup");
        assert_eq!(storage.get("region").unwrap(), "us-east-1");
        assert_eq!(storage.get("provider").unwrap(), "s3");

        // the backup-config key itself is stripped, the rest carries over
        assert!(derived.backup_config().is_none());
        assert_eq!(derived.remote_dir(), Some(vec!["tenantA".to_string()]));
    }

    #[test]
    fn backup_derived_is_an_independent_copy() {
        let c = cfg(json!({
            "STORAGE_CONFIG": {"provider": "s3", "bucket": "primary", "region": "us-east-1"},
            "BACKUP_CONFIG": {"bucket": "backup"}
        }));
        let derived = c.backup_derived().unwrap();
        // primary mapping unchanged after derivation
        assert_eq!(
            c.storage_config().unwrap().get("bucket").unwrap(),
            "primary"
        );
        assert!(c.backup_config().is_some());
        assert_ne!(c, derived);
    }

    #[test]
    fn backup_requires_storage_config() {
        let c = cfg(json!({"BACKUP_CONFIG": {"bucket": "backup"}}));
        assert!(c.backup_derived().is_none());
    }

    #[test]
    fn config_round_trips_through_json() {
        let c = cfg(json!({
            "REMOTE_DIR": ["a", "b"],
            "SECRET_KEY": "s",
            "STORAGE_CONFIG": {"provider": "local", "bucket": "files"}
        }));
        let raw = serde_json::to_string(&c).unwrap();
        let back: RawConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(c, back);
    }
}
