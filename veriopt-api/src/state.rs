//! Shared handler state

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::repository::JobStore;
use crate::service::llm_service::LlmClient;

/// State handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub config: Arc<ApiConfig>,
    pub llm: Arc<LlmClient>,
}

impl AppState {
    pub fn new(store: Arc<dyn JobStore>, config: ApiConfig, llm: LlmClient) -> Self {
        Self {
            store,
            config: Arc::new(config),
            llm: Arc::new(llm),
        }
    }
}
