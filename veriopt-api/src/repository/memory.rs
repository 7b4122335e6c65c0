//! In-memory Job Repository
//!
//! Used when no `DATABASE_URL` is configured (local demos) and by tests.
//! Every operation runs inside one mutex section, which gives the same
//! atomicity the Postgres store gets from row locks.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use veriopt_core::domain::job::{Job, JobId, JobState};
use veriopt_core::dto::job::JobUpdate;

use super::{JobStore, Reconciled, StoreError};

#[derive(Debug, Default)]
pub struct MemoryJobStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    jobs: HashMap<JobId, Job>,
    /// Submission order of queued jobs
    queue: VecDeque<JobId>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: &Job) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;

        if inner.jobs.contains_key(&job.job_id) {
            return Err(StoreError::Duplicate(job.job_id.clone()));
        }

        if job.state == JobState::Queued {
            inner.queue.push_back(job.job_id.clone());
        }
        inner.jobs.insert(job.job_id.clone(), job.clone());

        Ok(())
    }

    async fn find(&self, job_id: &JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.inner.lock().await.jobs.get(job_id).cloned())
    }

    async fn apply_update(
        &self,
        job_id: &JobId,
        update: &JobUpdate,
    ) -> Result<Option<Reconciled>, StoreError> {
        let mut inner = self.inner.lock().await;

        let Some(job) = inner.jobs.get_mut(job_id) else {
            return Ok(None);
        };

        let change = job.apply_update(update, Utc::now());

        Ok(Some(Reconciled {
            job: job.clone(),
            change,
        }))
    }

    async fn claim_next(&self) -> Result<Option<Job>, StoreError> {
        let mut inner = self.inner.lock().await;
        let Inner { jobs, queue } = &mut *inner;

        // Jobs moved past `queued` by a callback are dropped from the queue here.
        while let Some(job_id) = queue.pop_front() {
            match jobs.get_mut(&job_id) {
                Some(job) if job.state == JobState::Queued => {
                    job.state = JobState::Running;
                    job.updated_at = Utc::now();
                    return Ok(Some(job.clone()));
                }
                _ => continue,
            }
        }

        Ok(None)
    }
}
