//! Stowage Worker Library
//!
//! Mutating storage operations never run on the request path: they are
//! described as typed jobs, wrapped in an envelope carrying the tenant's full
//! configuration snapshot, and handed to a job queue for out-of-band
//! execution. On the worker side an equivalent VHost is rebuilt from the
//! snapshot and the job variant is matched and executed.
//!
//! The external queue engine is an opaque collaborator behind the [`JobQueue`]
//! trait; [`LocalQueue`] is an in-process tokio implementation of the same
//! contract. Delivery is at-least-once: handlers tolerate duplicates (uploads
//! overwrite, deletes of a missing key surface the backend's own policy).

pub mod context;
pub mod job;
pub mod queue;

// Re-export commonly used types
pub use context::{JobHandlerContext, StorageJobHandler};
pub use job::{JobEnvelope, StorageJob};
pub use queue::{dispatch, JobQueue, LocalQueue, LocalQueueConfig};
