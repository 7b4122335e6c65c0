//! Job Poller
//!
//! Watches one job until it finishes, the attempt budget runs out, or the
//! caller cancels. Every successful lookup is surfaced as a [`PollUpdate`]
//! so callers can render partial results while the job is still running.
//!
//! Polling uses a fixed interval with no backoff. A fetch error counts as an
//! attempt and is otherwise ignored; exhausting the budget yields
//! [`PollOutcome::Pending`], which is not an error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use veriopt_core::domain::job::{Job, JobId};
use veriopt_core::domain::result::{PartialResult, has_completion_artifact};

use crate::OptimizerClient;
use crate::error::Result;

/// Anything that can look a job up by id
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn fetch_job(&self, job_id: &JobId) -> Result<Job>;
}

#[async_trait]
impl JobSource for OptimizerClient {
    async fn fetch_job(&self, job_id: &JobId) -> Result<Job> {
        self.get_job(job_id).await
    }
}

/// How many times to look and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 120,
            interval: Duration::from_secs(1),
        }
    }
}

/// Snapshot delivered after each successful lookup
#[derive(Debug, Clone)]
pub struct PollUpdate {
    /// 1-based attempt number that produced this snapshot
    pub attempt: u32,
    pub job: Job,
    /// Known parts of `job.result`, when a result exists
    pub partial: Option<PartialResult>,
}

/// How a poll loop ended
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// The job reached a terminal state or published its artifact
    Finished { job: Job, attempts: u32 },
    /// The budget ran out first; the job may still finish later
    Pending { attempts: u32, last_seen: Option<Job> },
    /// The caller lost interest
    Cancelled { attempts: u32 },
}

impl PollOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Finished { attempts, .. }
            | Self::Pending { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
        }
    }

    /// Most recent job snapshot, if any lookup succeeded
    pub fn job(&self) -> Option<&Job> {
        match self {
            Self::Finished { job, .. } => Some(job),
            Self::Pending { last_seen, .. } => last_seen.as_ref(),
            Self::Cancelled { .. } => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }
}

/// Whether a snapshot ends the watch
fn is_done(job: &Job) -> bool {
    job.state.is_terminal() || job.result.as_ref().is_some_and(has_completion_artifact)
}

/// Polls a [`JobSource`] under a [`PollPolicy`]
pub struct JobPoller<S: ?Sized> {
    source: Arc<S>,
    policy: PollPolicy,
}

impl<S: ?Sized> Clone for JobPoller<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            policy: self.policy,
        }
    }
}

impl<S: JobSource + ?Sized + 'static> JobPoller<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            policy: PollPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Poll `job_id` until it is done, the budget is spent, or `cancel` fires
    ///
    /// `on_update` runs after every successful lookup, including the one that
    /// finishes the loop.
    pub async fn poll<F>(&self, job_id: &JobId, cancel: &CancellationToken, mut on_update: F) -> PollOutcome
    where
        F: FnMut(&PollUpdate),
    {
        let max_attempts = self.policy.max_attempts;
        let mut last_seen: Option<Job> = None;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return PollOutcome::Cancelled {
                    attempts: attempt - 1,
                };
            }

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return PollOutcome::Cancelled { attempts: attempt - 1 };
                }
                fetched = self.source.fetch_job(job_id) => fetched,
            };

            match fetched {
                Ok(job) => {
                    let update = PollUpdate {
                        attempt,
                        partial: job.result.as_ref().map(PartialResult::from_result),
                        job,
                    };
                    on_update(&update);

                    if is_done(&update.job) {
                        tracing::debug!(
                            "Job {} done after {} attempt(s): {}",
                            job_id,
                            attempt,
                            update.job.state
                        );
                        return PollOutcome::Finished {
                            job: update.job,
                            attempts: attempt,
                        };
                    }

                    last_seen = Some(update.job);
                }
                Err(e) => {
                    tracing::debug!("Poll attempt {} for job {} failed: {}", attempt, job_id, e);
                }
            }

            if attempt < max_attempts {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return PollOutcome::Cancelled { attempts: attempt };
                    }
                    _ = tokio::time::sleep(self.policy.interval) => {}
                }
            }
        }

        tracing::debug!("Job {} still pending after {} attempt(s)", job_id, max_attempts);

        PollOutcome::Pending {
            attempts: max_attempts,
            last_seen,
        }
    }

    /// Run [`poll`](Self::poll) in a background task
    pub fn spawn(&self, job_id: JobId) -> PollHandle {
        let cancel = CancellationToken::new();
        let (tx, updates) = watch::channel(None);

        let poller = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            poller
                .poll(&job_id, &token, |update| {
                    tx.send_replace(Some(update.clone()));
                })
                .await
        });

        PollHandle {
            cancel,
            updates,
            task,
        }
    }
}

/// Handle to a spawned poll loop
///
/// Dropping the handle cancels the loop.
pub struct PollHandle {
    cancel: CancellationToken,
    updates: watch::Receiver<Option<PollUpdate>>,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    /// Stop polling at the next opportunity
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Receiver that always holds the latest snapshot
    pub fn updates(&self) -> watch::Receiver<Option<PollUpdate>> {
        self.updates.clone()
    }

    pub fn latest(&self) -> Option<PollUpdate> {
        self.updates.borrow().clone()
    }

    /// Wait for the loop to end
    pub async fn join(mut self) -> std::result::Result<PollOutcome, JoinError> {
        (&mut self.task).await
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
