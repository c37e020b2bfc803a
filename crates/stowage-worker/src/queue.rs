//! Job queue: dispatch entry point, queue capability trait, and the
//! in-process worker pool.
//!
//! Shutdown: [`LocalQueue::shutdown`] signals the pool to stop; it does not
//! wait for in-flight jobs. For graceful shutdown, coordinate with your
//! runtime and allow time for running jobs to finish before process exit.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::sleep;

use stowage_storage::VHost;

use crate::context::JobHandlerContext;
use crate::job::{JobEnvelope, StorageJob};

/// Maximum delay in seconds before retrying a failed job. Caps exponential
/// backoff so that high retry counts do not produce excessively long delays.
pub const MAX_RETRY_BACKOFF_SECS: u64 = 300;

/// Computes backoff in seconds for a given retry count (exponential with cap).
#[inline]
pub(crate) fn compute_retry_backoff_seconds(retry_count: u32) -> u64 {
    (2_u64.pow(retry_count)).min(MAX_RETRY_BACKOFF_SECS)
}

/// Submission capability of the job queue engine. Delivery is at-least-once;
/// duplicate or retried deliveries must be tolerated by the operations they
/// invoke.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Submit an envelope for out-of-band execution. Returns once the queue
    /// has accepted the job, not when the job has run.
    async fn enqueue(&self, envelope: JobEnvelope) -> Result<()>;
}

/// Dispatch a storage job for a tenant: fire-and-forget from the caller's
/// viewpoint. The envelope carries the tenant's full configuration snapshot
/// so the worker can rebuild an equivalent VHost.
///
/// No ordering is guaranteed between two dispatched jobs for the same
/// relpath; callers needing ordering must serialize at dispatch time.
pub async fn dispatch(queue: &dyn JobQueue, vhost: &VHost, job: StorageJob) -> Result<()> {
    tracing::info!(op = job.op(), relpath = %job.relpath(), "dispatching storage job");
    queue
        .enqueue(JobEnvelope {
            config: vhost.config().clone(),
            job,
        })
        .await
}

#[derive(Clone)]
pub struct LocalQueueConfig {
    pub max_workers: usize,
    pub max_retries: u32,
    /// Capacity of the submission channel; enqueue waits when full.
    pub buffer: usize,
}

impl Default for LocalQueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            max_retries: 3,
            buffer: 256,
        }
    }
}

/// In-process queue engine: a tokio channel feeding a semaphore-bounded
/// worker pool with capped exponential retry.
pub struct LocalQueue {
    tx: mpsc::Sender<JobEnvelope>,
    shutdown_tx: mpsc::Sender<()>,
}

impl LocalQueue {
    /// Create a LocalQueue with a weak reference to the handler context.
    pub fn new(config: LocalQueueConfig, context: Weak<dyn JobHandlerContext>) -> Self {
        let (tx, rx) = mpsc::channel(config.buffer);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(Self::worker_pool(config, context, rx, shutdown_rx));

        Self { tx, shutdown_tx }
    }

    async fn worker_pool(
        config: LocalQueueConfig,
        context: Weak<dyn JobHandlerContext>,
        mut rx: mpsc::Receiver<JobEnvelope>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!(
            max_workers = config.max_workers,
            max_retries = config.max_retries,
            "job queue worker pool started"
        );

        let semaphore = Arc::new(Semaphore::new(config.max_workers));

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("job queue worker pool shutting down");
                    break;
                }
                delivered = rx.recv() => {
                    let Some(envelope) = delivered else { break };
                    let permit = match semaphore.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };
                    let ctx = context.clone();
                    let max_retries = config.max_retries;
                    tokio::spawn(async move {
                        let _permit = permit;
                        if let Err(e) = Self::process_with_retry(envelope, ctx, max_retries).await {
                            tracing::error!(error = %e, "job failed after retries");
                        }
                    });
                }
            }
        }

        tracing::info!("job queue worker pool stopped");
    }

    async fn process_with_retry(
        envelope: JobEnvelope,
        context: Weak<dyn JobHandlerContext>,
        max_retries: u32,
    ) -> Result<()> {
        let mut attempt = 0;
        loop {
            let ctx = context
                .upgrade()
                .ok_or_else(|| anyhow!("job handler context was dropped, cannot process job"))?;

            match ctx.handle(envelope.clone()).await {
                Ok(()) => {
                    tracing::info!(
                        op = envelope.job.op(),
                        relpath = %envelope.job.relpath(),
                        attempt,
                        "job completed"
                    );
                    return Ok(());
                }
                Err(e) if attempt < max_retries => {
                    let backoff = compute_retry_backoff_seconds(attempt);
                    tracing::warn!(
                        error = %e,
                        op = envelope.job.op(),
                        relpath = %envelope.job.relpath(),
                        attempt,
                        backoff_seconds = backoff,
                        "job failed, scheduling retry"
                    );
                    sleep(Duration::from_secs(backoff)).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        op = envelope.job.op(),
                        relpath = %envelope.job.relpath(),
                        attempt,
                        "job failed, retries exhausted"
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Signals the worker pool to stop claiming new jobs and exit the main
    /// loop. Returns immediately after sending the signal; already-spawned
    /// job handlers continue running until they complete.
    pub async fn shutdown(&self) {
        tracing::info!("initiating job queue shutdown");
        let _ = self.shutdown_tx.send(()).await;
    }
}

#[async_trait]
impl JobQueue for LocalQueue {
    async fn enqueue(&self, envelope: JobEnvelope) -> Result<()> {
        self.tx
            .send(envelope)
            .await
            .map_err(|_| anyhow!("job queue is shut down"))
    }
}
