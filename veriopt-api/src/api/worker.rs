//! Worker API Handlers
//!
//! Endpoints reserved for optimization workers. Both require the shared
//! worker secret, checked before any storage access.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use veriopt_core::dto::job::FinishJob;

use crate::api::error::{ApiError, ApiResult};
use crate::service::job_service;
use crate::state::AppState;

/// Check `Authorization: Bearer <token>` against the configured secret
fn authorize_worker(headers: &HeaderMap, expected: &str) -> ApiResult<()> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    match token {
        Some(token) if !token.is_empty() && token == expected => Ok(()),
        _ => {
            tracing::warn!("Rejected worker request with missing or invalid token");
            Err(ApiError::Unauthorized)
        }
    }
}

/// GET|POST /next-queued-job
/// Atomically claim the oldest queued job
///
/// 200 with the claimed record, 204 when the queue is empty.
pub async fn next_queued_job(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    authorize_worker(&headers, &state.config.worker_token)?;

    let response = match job_service::claim_next(state.store.as_ref()).await? {
        Some(job) => Json(job).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    };

    Ok(response)
}

/// POST /finish-job
/// Finalize a job as completed or failed
pub async fn finish_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<FinishJob>,
) -> ApiResult<StatusCode> {
    authorize_worker(&headers, &state.config.worker_token)?;

    tracing::info!("Finishing job: {} with status {}", req.job_id, req.status);

    job_service::finish(state.store.as_ref(), req).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_authorize_worker() {
        assert!(authorize_worker(&headers("Bearer s3cret"), "s3cret").is_ok());
        assert!(authorize_worker(&headers("Bearer wrong"), "s3cret").is_err());
        assert!(authorize_worker(&headers("s3cret"), "s3cret").is_err());
        assert!(authorize_worker(&headers("Bearer "), "").is_err());
        assert!(authorize_worker(&HeaderMap::new(), "s3cret").is_err());
    }
}
