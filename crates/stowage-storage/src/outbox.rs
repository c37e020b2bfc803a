//! Pending-upload outbox collaborator.
//!
//! The outbox tracks uploads awaiting completion, keyed by hostname and
//! relative path. The gateway only ever clears entries.

use crate::backend::StorageResult;
use async_trait::async_trait;

/// Clearing capability of the pending-upload tracker.
#[async_trait]
pub trait Outbox: Send + Sync {
    async fn delete(&self, hostname: &str, relpath: &str) -> StorageResult<()>;
}

/// Outbox that drops every clear request. For deployments without a
/// pending-upload tracker.
#[derive(Debug, Clone, Default)]
pub struct NoopOutbox;

#[async_trait]
impl Outbox for NoopOutbox {
    async fn delete(&self, _hostname: &str, _relpath: &str) -> StorageResult<()> {
        Ok(())
    }
}
