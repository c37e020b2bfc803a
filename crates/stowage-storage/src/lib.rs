//! Stowage Storage Library
//!
//! This crate provides the object-storage capability abstraction and the
//! per-tenant storage gateway. It includes the `ObjectBackend` trait with S3
//! and local-filesystem implementations, the `VHost` value, and the narrow
//! collaborator traits for the local blob cache and the pending-upload
//! outbox.
//!
//! # Object key format
//!
//! Every operation addresses objects by `join(remote_dir..., relpath)` with
//! `/` as the separator; a tenant without a remote directory uses `relpath`
//! unchanged. The relative path is never normalized, trimmed, or re-escaped.
//! Key construction is centralized in the `keys` module so the gateway and
//! the backup replicator stay consistent.

pub mod backend;
pub mod cache;
pub mod context;
pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod outbox;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod vhost;

// Re-export commonly used types
pub use backend::{ByteStream, ObjectBackend, StorageError, StorageResult, UrlStyle};
pub use cache::{BlobCache, DiskCache};
pub use context::GatewayContext;
pub use factory::create_backend;
pub use keys::remote_key;
#[cfg(feature = "storage-local")]
pub use local::LocalBackend;
pub use outbox::{NoopOutbox, Outbox};
#[cfg(feature = "storage-s3")]
pub use s3::S3Backend;
pub use vhost::{CreateOutcome, VHost};
