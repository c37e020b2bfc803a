//! Default response header maps and the per-key override rule.
//!
//! Both maps always contain at least the built-in defaults; a configured
//! override replaces individual keys and never wipes the whole default set.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Default headers attached to downloads.
pub fn download_defaults() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "Cache-Control".to_string(),
        "public, max-age=31536000".to_string(),
    )])
}

/// Default CORS headers attached to uploads and to the canonical 401 response.
pub fn cors_defaults() -> BTreeMap<String, String> {
    [
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "POST, PUT"),
        ("Access-Control-Allow-Headers", "Content-Type"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Merge configured overrides into a default map. Override wins on conflict;
/// non-string override values are ignored.
pub fn merged(
    mut defaults: BTreeMap<String, String>,
    overrides: Option<&Map<String, Value>>,
) -> BTreeMap<String, String> {
    if let Some(overrides) = overrides {
        for (name, value) in overrides {
            if let Some(value) = value.as_str() {
                defaults.insert(name.clone(), value.to_string());
            }
        }
    }
    defaults
}
