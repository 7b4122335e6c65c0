//! Configuration module
//!
//! Handles CLI configuration: backend URL and the optional worker secret.

use anyhow::{Result, bail};
use veriopt_client::OptimizerClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the backend
    pub api_url: String,

    /// Worker secret, only needed by `worker` commands
    pub worker_token: Option<String>,
}

impl Config {
    /// Client for the public endpoints
    pub fn client(&self) -> OptimizerClient {
        OptimizerClient::new(&self.api_url)
    }

    /// Client authorized for the worker endpoints
    pub fn worker_client(&self) -> Result<OptimizerClient> {
        match self.worker_token.as_deref() {
            Some(token) if !token.trim().is_empty() => {
                Ok(self.client().with_worker_token(token.trim()))
            }
            _ => bail!("Worker commands need a token: pass --worker-token or set WORKER_TOKEN"),
        }
    }
}
