//! Health Check API Handler
//!
//! Liveness check for monitoring and for clients checking reachability.

use axum::Json;
use veriopt_core::dto::job::Ack;

/// GET /healthz
pub async fn health_check() -> Json<Ack> {
    Json(Ack::OK)
}
