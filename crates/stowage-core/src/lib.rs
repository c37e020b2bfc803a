//! Stowage Core Library
//!
//! This crate provides the per-tenant configuration model, the HMAC request
//! authorization guard, and the multi-tenant registry shared across all
//! stowage components.

pub mod auth;
pub mod config;
pub mod headers;
pub mod tenants;

// Re-export commonly used types
pub use auth::{AuthGuard, AuthParams};
pub use config::RawConfig;
pub use tenants::TenantRegistry;
