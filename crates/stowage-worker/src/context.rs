//! Job handler context trait
//!
//! The worker holds a weak reference to a handler context and calls `handle`
//! for every delivered envelope. [`StorageJobHandler`] is the standard
//! implementation: it rebuilds the tenant VHost from the envelope's
//! configuration snapshot and matches on the job variant.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use stowage_storage::{CreateOutcome, GatewayContext, VHost};

use crate::job::{JobEnvelope, StorageJob};

/// Context for job execution.
///
/// The worker pool holds a weak reference so a dropped context stops
/// processing instead of leaking the collaborators it carries.
#[async_trait]
pub trait JobHandlerContext: Send + Sync {
    async fn handle(self: Arc<Self>, envelope: JobEnvelope) -> Result<()>;
}

/// Standard handler: reconstructs a VHost from the snapshot and runs the
/// gateway operation with an explicit collaborator context. A successful
/// upload is followed by backup replication.
pub struct StorageJobHandler {
    gateway: GatewayContext,
}

impl StorageJobHandler {
    pub fn new(gateway: GatewayContext) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl JobHandlerContext for StorageJobHandler {
    async fn handle(self: Arc<Self>, envelope: JobEnvelope) -> Result<()> {
        let vhost = VHost::from_config(envelope.config).await?;

        match envelope.job {
            StorageJob::Create { relpath, cache_key } => {
                let outcome = vhost
                    .storage_create(&relpath, &cache_key, &self.gateway)
                    .await?;
                if outcome == CreateOutcome::Uploaded {
                    vhost.backup_file(&relpath).await?;
                }
            }
            StorageJob::Destroy { relpath } => {
                vhost.storage_destroy(&relpath).await?;
            }
        }

        Ok(())
    }
}
