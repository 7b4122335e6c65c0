//! Job Service
//!
//! Business logic for the optimization job lifecycle: submission, lookup,
//! worker callbacks and queue claims.

use serde_json::Value;
use veriopt_core::domain::job::{Job, JobId, StateChange};
use veriopt_core::domain::spec::OptimizationSpec;
use veriopt_core::dto::job::{FinishJob, JobUpdate};

use crate::repository::{JobStore, StoreError};

/// Service error type
#[derive(Debug)]
pub enum JobError {
    NotFound(JobId),
    ValidationError(String),
    StorageError(StoreError),
}

impl From<StoreError> for JobError {
    fn from(err: StoreError) -> Self {
        JobError::StorageError(err)
    }
}

/// Validate a spec and enqueue a new job for it
///
/// Every call creates a new job; there is no idempotency key.
pub async fn submit(store: &dyn JobStore, spec: OptimizationSpec) -> Result<Job, JobError> {
    spec.validate().map_err(JobError::ValidationError)?;

    let job = Job::queued(spec);
    store.insert(&job).await?;

    tracing::info!("Job queued: {}", job.job_id);

    Ok(job)
}

/// Get a job by ID
pub async fn get_job(store: &dyn JobStore, job_id: &JobId) -> Result<Job, JobError> {
    store
        .find(job_id)
        .await?
        .ok_or_else(|| JobError::NotFound(job_id.clone()))
}

/// Turn a raw callback body into a typed update
///
/// The correlation key is checked before anything else, so a body without
/// one is reported as such even if other fields are malformed.
pub fn parse_update(body: Value) -> Result<JobUpdate, JobError> {
    let has_job_id = body
        .get("job_id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.trim().is_empty());
    if !has_job_id {
        return Err(JobError::ValidationError("job_id required".to_string()));
    }

    serde_json::from_value(body).map_err(|e| JobError::ValidationError(e.to_string()))
}

/// Merge a worker update into the job it names
///
/// Safe to repeat: re-applying the same update leaves the record as it was
/// apart from `updated_at`.
pub async fn reconcile(store: &dyn JobStore, update: JobUpdate) -> Result<Job, JobError> {
    let job_id = update
        .correlation_key()
        .cloned()
        .ok_or_else(|| JobError::ValidationError("job_id required".to_string()))?;

    let reconciled = store
        .apply_update(&job_id, &update)
        .await?
        .ok_or_else(|| JobError::NotFound(job_id.clone()))?;

    match reconciled.change {
        StateChange::Advanced { from, to } => {
            tracing::info!("Job {} moved {} -> {}", job_id, from, to);
        }
        StateChange::Ignored { current, requested } => {
            tracing::warn!(
                "Ignoring backward transition for job {}: {} -> {}",
                job_id,
                current,
                requested
            );
        }
        StateChange::Unchanged => {
            tracing::debug!("Job {} updated", job_id);
        }
    }

    Ok(reconciled.job)
}

/// Finalize a job with a terminal status
pub async fn finish(store: &dyn JobStore, req: FinishJob) -> Result<Job, JobError> {
    if !req.status.is_terminal() {
        return Err(JobError::ValidationError(format!(
            "Invalid completion status: {}",
            req.status
        )));
    }

    reconcile(store, JobUpdate::from(req)).await
}

/// Claim the next queued job for a worker
///
/// `None` means the queue is empty, which is not an error.
pub async fn claim_next(store: &dyn JobStore) -> Result<Option<Job>, JobError> {
    let job = store.claim_next().await?;

    match &job {
        Some(job) => tracing::info!("Job {} claimed", job.job_id),
        None => tracing::debug!("No queued jobs to claim"),
    }

    Ok(job)
}
