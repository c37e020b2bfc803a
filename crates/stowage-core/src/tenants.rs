//! Multi-tenant registry: hostname to tenant configuration.
//!
//! The registry is loaded once at process start from a JSON document in the
//! environment and treated as read-only afterwards. A `*` entry serves as the
//! fallback for hosts without a dedicated configuration.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env;

use crate::config::RawConfig;

/// Environment variable holding the registry document: a JSON object mapping
/// hostname to tenant configuration mapping.
pub const VHOSTS_ENV: &str = "STOWAGE_VHOSTS";

/// Fallback entry used when a host has no dedicated configuration.
pub const WILDCARD_HOST: &str = "*";

#[derive(Debug, Clone, Default)]
pub struct TenantRegistry {
    vhosts: HashMap<String, RawConfig>,
}

impl TenantRegistry {
    /// Load the registry from the environment. An unset variable yields an
    /// empty registry; a malformed document is a configuration error.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        match env::var(VHOSTS_ENV) {
            Ok(raw) => Self::from_json(&raw),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let vhosts: HashMap<String, RawConfig> = serde_json::from_str(raw)
            .with_context(|| format!("{VHOSTS_ENV} must be a JSON object of hostname to tenant config"))?;
        tracing::info!(tenants = vhosts.len(), "tenant registry loaded");
        Ok(Self { vhosts })
    }

    /// Configuration for a host, falling back to the `*` entry.
    pub fn lookup(&self, host: &str) -> Option<&RawConfig> {
        self.vhosts.get(host).or_else(|| self.vhosts.get(WILDCARD_HOST))
    }

    pub fn len(&self) -> usize {
        self.vhosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vhosts.is_empty()
    }
}
