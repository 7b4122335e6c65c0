//! Submission and lookup endpoints

use crate::OptimizerClient;
use crate::error::{ClientError, Result, SubmissionError};
use veriopt_core::domain::job::{Job, JobId};
use veriopt_core::domain::spec::OptimizationSpec;
use veriopt_core::dto::job::{Ack, StartOptimization, StartOptimizationResponse};

impl OptimizerClient {
    // =============================================================================
    // Submission
    // =============================================================================

    /// Submit an optimization request and return the new job's id
    ///
    /// Sends exactly one request and never retries. There is no idempotency
    /// key, so submitting the same spec twice creates two jobs.
    ///
    /// # Example
    /// ```no_run
    /// # use veriopt_client::OptimizerClient;
    /// # use veriopt_core::domain::spec::OptimizationSpec;
    /// # async fn example() -> Result<(), veriopt_client::SubmissionError> {
    /// let client = OptimizerClient::new("http://localhost:8000");
    /// let job_id = client
    ///     .start_optimization(&OptimizationSpec::new("module top(); endmodule").with_max_iters(3))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start_optimization(
        &self,
        spec: &OptimizationSpec,
    ) -> std::result::Result<JobId, SubmissionError> {
        let url = self
            .endpoint(&["start-optimization"])
            .map_err(|e| SubmissionError::InvalidEndpoint(e.to_string()))?;
        let url_text = url.to_string();

        let body = StartOptimization { spec: spec.clone() };
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|source| SubmissionError::Unreachable {
                url: url_text.clone(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| SubmissionError::Unreachable {
                url: url_text.clone(),
                source,
            })?;

        if !status.is_success() {
            return Err(SubmissionError::Rejected {
                url: url_text,
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: StartOptimizationResponse =
            serde_json::from_str(&text).map_err(|e| SubmissionError::MalformedResponse {
                url: url_text.clone(),
                reason: e.to_string(),
            })?;

        let job_id = parsed
            .job_id
            .filter(|id| !id.is_blank())
            .ok_or(SubmissionError::MissingJobId { url: url_text })?;

        tracing::info!("Submitted optimization job: {}", job_id);

        Ok(job_id)
    }

    // =============================================================================
    // Lookup
    // =============================================================================

    /// Get a job by ID
    pub async fn get_job(&self, job_id: &JobId) -> Result<Job> {
        let url = self.endpoint(&["job", job_id.as_str()])?;
        let response = self.client.get(url).send().await?;

        self.handle_response(response).await
    }

    /// Check that the backend is reachable
    pub async fn ping(&self) -> Result<()> {
        let url = self.endpoint(&["healthz"])?;
        let response = self.client.get(url).send().await?;

        let ack: Ack = self.handle_response(response).await?;
        if !ack.ok {
            return Err(ClientError::ParseError(
                "Health check did not report ok".to_string(),
            ));
        }

        Ok(())
    }
}
