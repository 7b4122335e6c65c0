//! Worker-side endpoints
//!
//! Claim and finish require the worker secret configured with
//! [`OptimizerClient::with_worker_token`]. The progress callback is open.

use reqwest::StatusCode;

use crate::OptimizerClient;
use crate::error::Result;
use veriopt_core::domain::job::Job;
use veriopt_core::dto::job::{Ack, FinishJob, JobUpdate};

impl OptimizerClient {
    // =============================================================================
    // Worker Lifecycle
    // =============================================================================

    /// Claim the oldest queued job
    ///
    /// # Returns
    /// `Some(job)` already moved to `running`, or `None` when the queue is empty
    pub async fn claim_next_job(&self) -> Result<Option<Job>> {
        let token = self.require_worker_token()?;
        let url = self.endpoint(&["next-queued-job"])?;
        let response = self.client.post(url).bearer_auth(token).send().await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let job: Job = self.handle_response(response).await?;
        tracing::debug!("Claimed job: {}", job.job_id);

        Ok(Some(job))
    }

    /// Post a progress or result update for a job
    pub async fn post_update(&self, update: &JobUpdate) -> Result<()> {
        let url = self.endpoint(&["eda-worker-callback"])?;
        let response = self.client.post(url).json(update).send().await?;

        let _: Ack = self.handle_response(response).await?;
        Ok(())
    }

    /// Finalize a job as completed or failed
    pub async fn finish_job(&self, req: &FinishJob) -> Result<()> {
        let token = self.require_worker_token()?;
        let url = self.endpoint(&["finish-job"])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(req)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
