//! Repository Module
//!
//! Data access layer for the backend.
//!
//! Job records are shared by untrusted endpoints (worker callbacks, worker
//! claims) that may run concurrently. The store therefore exposes the two
//! mutations as single transactional operations, never as a read followed
//! by a separate write:
//! - `apply_update`: merge-patch a worker update into one record
//! - `claim_next`: atomically move the oldest queued job to running

pub mod job;
pub mod memory;

// Re-export for convenience
pub use job::PgJobStore;
pub use memory::MemoryJobStore;

use async_trait::async_trait;
use veriopt_core::domain::job::{Job, JobId, StateChange};
use veriopt_core::dto::job::JobUpdate;

/// Storage error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Error reported by the database, message kept verbatim
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("job {0} already exists")]
    Duplicate(JobId),

    /// A stored row could not be decoded into a job
    #[error("corrupt job record {job_id}: {reason}")]
    Corrupt { job_id: String, reason: String },
}

/// Result of merging an update into a stored job
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub job: Job,
    pub change: StateChange,
}

/// Persistence for optimization jobs
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a newly submitted job
    async fn insert(&self, job: &Job) -> Result<(), StoreError>;

    /// Find a job by ID
    async fn find(&self, job_id: &JobId) -> Result<Option<Job>, StoreError>;

    /// Merge `update` into the job keyed by `job_id`
    ///
    /// Returns `None` if no such job exists; a missing job is never created.
    async fn apply_update(
        &self,
        job_id: &JobId,
        update: &JobUpdate,
    ) -> Result<Option<Reconciled>, StoreError>;

    /// Claim the oldest queued job, moving it to running
    ///
    /// Concurrent callers never receive the same job. Returns `None` when
    /// nothing is queued.
    async fn claim_next(&self) -> Result<Option<Job>, StoreError>;
}
