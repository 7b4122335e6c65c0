//! Job API Handlers
//!
//! Client-facing submission and lookup, plus the worker callback that
//! reconciles asynchronous updates into job state.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;
use veriopt_core::domain::job::{Job, JobId};
use veriopt_core::dto::job::{Ack, StartOptimization, StartOptimizationResponse};

use crate::api::error::ApiResult;
use crate::service::job_service;
use crate::state::AppState;

/// POST /start-optimization
/// Enqueue a new optimization job
pub async fn start_optimization(
    State(state): State<AppState>,
    Json(req): Json<StartOptimization>,
) -> ApiResult<(StatusCode, Json<StartOptimizationResponse>)> {
    let job = job_service::submit(state.store.as_ref(), req.spec).await?;

    Ok((
        StatusCode::CREATED,
        Json(StartOptimizationResponse {
            job_id: Some(job.job_id),
        }),
    ))
}

/// GET /job/{job_id}
/// Get job details by ID
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    tracing::debug!("Getting job: {}", job_id);

    let job = job_service::get_job(state.store.as_ref(), &JobId::from(job_id)).await?;

    Ok(Json(job))
}

/// POST /eda-worker-callback
/// Merge a worker's progress or result update into the job record
///
/// The body is taken as raw JSON so field errors come back as 400s with the
/// usual `{"error": ...}` shape.
pub async fn worker_callback(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Ack>> {
    let update = job_service::parse_update(body)?;

    tracing::debug!("Worker callback for job: {:?}", update.job_id);

    job_service::reconcile(state.store.as_ref(), update).await?;

    Ok(Json(Ack::OK))
}
