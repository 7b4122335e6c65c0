//! Veriopt HTTP Client
//!
//! A small, type-safe client for the optimization backend.
//!
//! Front ends use it to submit jobs and watch them; the demo worker uses the
//! token-protected claim and finish endpoints. The [`poller`] module turns
//! repeated job lookups into a cancellable watch loop.
//!
//! # Example
//!
//! ```no_run
//! use veriopt_client::OptimizerClient;
//! use veriopt_core::domain::spec::OptimizationSpec;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OptimizerClient::new("http://localhost:8000");
//!
//!     let job_id = client
//!         .start_optimization(&OptimizationSpec::new("module top(); endmodule"))
//!         .await?;
//!
//!     println!("Submitted job: {}", job_id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
pub mod poller;
mod worker;

// Re-export commonly used types
pub use error::{ClientError, Result, SubmissionError};
pub use poller::{JobPoller, JobSource, PollHandle, PollOutcome, PollPolicy, PollUpdate};

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

/// HTTP client for the optimization backend
///
/// Methods are grouped by caller:
/// - Submission and lookup (start optimization, get job, health)
/// - Worker lifecycle (claim, progress callback, finish)
#[derive(Debug, Clone)]
pub struct OptimizerClient {
    /// Base URL of the backend (e.g., "http://localhost:8000")
    base_url: String,
    /// Shared secret sent as a bearer token on worker endpoints
    worker_token: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl OptimizerClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use veriopt_client::OptimizerClient;
    ///
    /// let client = OptimizerClient::new("http://localhost:8000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            worker_token: None,
            client,
        }
    }

    /// Attach the worker secret used by the claim and finish endpoints
    pub fn with_worker_token(mut self, token: impl Into<String>) -> Self {
        self.worker_token = Some(token.into());
        self
    }

    /// Get the base URL of the backend
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an endpoint URL, percent-encoding each path segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::InvalidRequest(format!("Invalid base URL {}: {}", self.base_url, e))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidRequest(format!("Base URL cannot take a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn require_worker_token(&self) -> Result<&str> {
        self.worker_token
            .as_deref()
            .ok_or_else(|| ClientError::InvalidRequest("Worker token not configured".to_string()))
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
