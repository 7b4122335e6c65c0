//! API Module
//!
//! HTTP API layer for the backend.
//! Each submodule handles endpoints for a specific caller:
//! - `job`: front-end submission/lookup and the worker callback
//! - `worker`: token-protected claim and finish endpoints
//! - `llm`: relay to the chat completions upstream

pub mod error;
pub mod health;
pub mod job;
pub mod llm;
pub mod worker;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        // Health check
        .route("/healthz", get(health::health_check))
        // Client endpoints
        .route("/start-optimization", post(job::start_optimization))
        .route("/job/{job_id}", get(job::get_job))
        // Worker endpoints
        .route("/eda-worker-callback", post(job::worker_callback))
        .route(
            "/next-queued-job",
            get(worker::next_queued_job).post(worker::next_queued_job),
        )
        .route("/finish-job", post(worker::finish_job))
        // LLM relay
        .route("/llm-orchestrator", post(llm::llm_orchestrator))
        // Add state and middleware
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// `*` anywhere in the list opens the API to every origin, without
/// credentials since browsers refuse a wildcard origin alongside them.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    if origins.iter().any(|origin| origin == "*") {
        tracing::info!("CORS open to any origin; credentials disabled");
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}
