//! Explicit collaborator context for gateway operations.
//!
//! The blob cache and the outbox are process-level collaborators whose
//! lifecycle is owned by the entry point; gateway operations receive them as
//! an explicit value rather than reaching for globals.

use crate::cache::BlobCache;
use crate::outbox::Outbox;
use std::sync::Arc;

#[derive(Clone)]
pub struct GatewayContext {
    pub cache: Arc<dyn BlobCache>,
    pub outbox: Option<Arc<dyn Outbox>>,
}

impl GatewayContext {
    pub fn new(cache: Arc<dyn BlobCache>) -> Self {
        Self {
            cache,
            outbox: None,
        }
    }

    pub fn with_outbox(mut self, outbox: Arc<dyn Outbox>) -> Self {
        self.outbox = Some(outbox);
        self
    }
}
