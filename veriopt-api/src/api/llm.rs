//! LLM Relay API Handler

use axum::{Json, extract::State};
use serde_json::Value;
use veriopt_core::dto::llm::LlmRequest;

use crate::api::error::ApiResult;
use crate::service::llm_service;
use crate::state::AppState;

/// POST /llm-orchestrator
/// Prompt the model as one of the agent roles and return its JSON reply
pub async fn llm_orchestrator(
    State(state): State<AppState>,
    Json(req): Json<LlmRequest>,
) -> ApiResult<Json<Value>> {
    let role = llm_service::parse_role(&req.role)?;

    tracing::info!("LLM call for role: {}", role);

    let reply = state.llm.complete(role, &req.payload).await?;

    Ok(Json(reply))
}
