//! Router-level tests for the job lifecycle endpoints.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{
    BrokenStore, CountingStore, WORKER_TOKEN, body_bytes, body_json, build_test_app,
    build_test_app_with, get, memory_store, post_as_worker, post_json,
};
use serde_json::{Value, json};
use tower::ServiceExt;

use veriopt_api::ApiConfig;
use veriopt_api::repository::JobStore;
use veriopt_core::domain::job::{JobId, JobState};

fn spec_body() -> Value {
    json!({
        "spec": {
            "source": "module top(input a, output b); assign b = a; endmodule",
            "options": {"power": true, "timing": true, "area": false},
            "budgets": {"max_iters": 3}
        }
    })
}

async fn submit(app: &axum::Router) -> String {
    let response = post_json(app.clone(), "/start-optimization", spec_body()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["job_id"].as_str().unwrap().to_string()
}

async fn fetch(app: &axum::Router, job_id: &str) -> Value {
    let response = get(app.clone(), &format!("/job/{}", job_id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Health and submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok() {
    let app = build_test_app(memory_store());
    let response = get(app, "/healthz").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"ok": true}));
}

#[tokio::test]
async fn submission_creates_queued_job() {
    let app = build_test_app(memory_store());
    let job_id = submit(&app).await;

    let job = fetch(&app, &job_id).await;
    assert_eq!(job["job_id"], job_id.as_str());
    assert_eq!(job["state"], "queued");
    assert_eq!(job["spec"]["budgets"]["max_iters"], 3);
}

#[tokio::test]
async fn submissions_yield_distinct_ids() {
    let app = build_test_app(memory_store());
    let first = submit(&app).await;
    let second = submit(&app).await;

    assert!(!first.is_empty());
    assert!(!second.is_empty());
    assert_ne!(first, second);
}

#[tokio::test]
async fn submission_with_empty_source_is_rejected() {
    let store = memory_store();
    let app = build_test_app(store.clone());
    let response = post_json(app, "/start-optimization", json!({"spec": {"source": "  "}})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "spec.source must not be empty"})
    );
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn submission_without_targets_is_rejected() {
    let store = memory_store();
    let app = build_test_app(store.clone());
    let body = json!({
        "spec": {
            "source": "module m; endmodule",
            "options": {"power": false, "timing": false, "area": false}
        }
    });
    let response = post_json(app, "/start-optimization", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "spec.options must enable at least one of power, timing or area"})
    );
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn submission_with_empty_options_uses_default_targets() {
    let app = build_test_app(memory_store());
    let body = json!({"spec": {"source": "module m; endmodule", "options": {}}});
    let response = post_json(app.clone(), "/start-optimization", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let job_id = body_json(response).await["job_id"].as_str().unwrap().to_string();

    let job = fetch(&app, &job_id).await;
    assert_eq!(
        job["spec"]["options"],
        json!({"power": true, "timing": true, "area": false})
    );
}

#[tokio::test]
async fn unknown_job_returns_404() {
    let app = build_test_app(memory_store());
    let response = get(app, "/job/does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Job does-not-exist not found"})
    );
}

// ---------------------------------------------------------------------------
// Worker callback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn callback_without_job_id_is_rejected() {
    let app = build_test_app(memory_store());

    for body in [json!({"state": "running"}), json!({"job_id": "", "state": "running"})] {
        let response = post_json(app.clone(), "/eda-worker-callback", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"error": "job_id required"}));
    }
}

#[tokio::test]
async fn callback_without_job_id_and_bad_fields_still_asks_for_job_id() {
    let app = build_test_app(memory_store());

    for body in [
        json!({"state": "paused"}),
        json!({"iteration": "two"}),
        json!({"job_id": 42, "state": "running"}),
    ] {
        let response = post_json(app.clone(), "/eda-worker-callback", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"error": "job_id required"}));
    }
}

#[tokio::test]
async fn callback_with_malformed_field_is_a_json_400() {
    let app = build_test_app(memory_store());
    let job_id = submit(&app).await;

    for (body, needle) in [
        (json!({"job_id": job_id, "state": "paused"}), "unknown variant `paused`"),
        (json!({"job_id": job_id, "iteration": "two"}), "invalid type"),
    ] {
        let response = post_json(app.clone(), "/eda-worker-callback", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        let message = json["error"].as_str().unwrap();
        assert!(message.contains(needle), "unexpected error: {message}");
    }

    // nothing was merged
    let job = fetch(&app, &job_id).await;
    assert_eq!(job["state"], "queued");
    assert!(job.get("iteration").is_none());
}

#[tokio::test]
async fn callback_for_unknown_job_returns_404() {
    let store = memory_store();
    let app = build_test_app(store.clone());
    let response = post_json(
        app,
        "/eda-worker-callback",
        json!({"job_id": "ghost", "state": "running"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn callback_merges_partial_updates() {
    let app = build_test_app(memory_store());
    let job_id = submit(&app).await;

    let response = post_json(
        app.clone(),
        "/eda-worker-callback",
        json!({
            "job_id": job_id,
            "state": "running",
            "iteration": 1,
            "result": {"metrics": {"power_savings_pct": 12.5}},
            "insights": ["gated clock on fifo"]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"ok": true}));

    post_json(
        app.clone(),
        "/eda-worker-callback",
        json!({
            "job_id": job_id,
            "iteration": 2,
            "logs_tail": "iteration 2 done",
            "result": {"optimized_source": "module top(); endmodule"}
        }),
    )
    .await;

    let job = fetch(&app, &job_id).await;
    assert_eq!(job["state"], "running");
    assert_eq!(job["iteration"], 2);
    assert_eq!(job["logs_tail"], "iteration 2 done");
    assert_eq!(job["result"]["metrics"]["power_savings_pct"], 12.5);
    assert_eq!(job["result"]["optimized_source"], "module top(); endmodule");
    assert_eq!(job["metadata"]["insights"][0], "gated clock on fifo");
}

#[tokio::test]
async fn callback_is_idempotent() {
    let app = build_test_app(memory_store());
    let job_id = submit(&app).await;
    let update = json!({
        "job_id": job_id,
        "state": "running",
        "iteration": 4,
        "result": {"metrics": {"timing_improvement_pct": 15.0}}
    });

    post_json(app.clone(), "/eda-worker-callback", update.clone()).await;
    let mut once = fetch(&app, &job_id).await;
    post_json(app.clone(), "/eda-worker-callback", update).await;
    let mut twice = fetch(&app, &job_id).await;

    once.as_object_mut().unwrap().remove("updated_at");
    twice.as_object_mut().unwrap().remove("updated_at");
    assert_eq!(once, twice);
}

#[tokio::test]
async fn callback_accepts_succeeded_as_completed() {
    let app = build_test_app(memory_store());
    let job_id = submit(&app).await;

    post_json(
        app.clone(),
        "/eda-worker-callback",
        json!({"job_id": job_id, "state": "succeeded"}),
    )
    .await;

    assert_eq!(fetch(&app, &job_id).await["state"], "completed");
}

#[tokio::test]
async fn terminal_state_is_never_left() {
    let app = build_test_app(memory_store());
    let job_id = submit(&app).await;

    post_json(
        app.clone(),
        "/eda-worker-callback",
        json!({"job_id": job_id, "state": "failed"}),
    )
    .await;
    let response = post_json(
        app.clone(),
        "/eda-worker-callback",
        json!({"job_id": job_id, "state": "running", "logs_tail": "late log line"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let job = fetch(&app, &job_id).await;
    assert_eq!(job["state"], "failed");
    assert_eq!(job["logs_tail"], "late log line");
}

#[tokio::test]
async fn storage_failure_is_reported_verbatim() {
    let app = build_test_app(Arc::new(BrokenStore));
    let response = post_json(
        app,
        "/eda-worker-callback",
        json!({"job_id": "any", "state": "running"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let expected = sqlx::Error::PoolTimedOut.to_string();
    assert_eq!(body_json(response).await, json!({"error": expected}));
}

// ---------------------------------------------------------------------------
// Queue claim and finish
// ---------------------------------------------------------------------------

#[tokio::test]
async fn claim_without_valid_token_touches_no_storage() {
    let store = CountingStore::new();
    let app = build_test_app(store.clone());
    submit(&app).await;
    let before = store.calls();

    for token in [None, Some("wrong-token"), Some("")] {
        let response = post_as_worker(app.clone(), "/next-queued-job", token, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({"error": "Unauthorized"}));
    }

    let response = post_as_worker(
        app.clone(),
        "/finish-job",
        Some("wrong-token"),
        Some(json!({"job_id": "x", "status": "completed"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(store.calls(), before);
}

#[tokio::test]
async fn claim_on_empty_queue_returns_204() {
    let app = build_test_app(memory_store());
    let response = post_as_worker(app, "/next-queued-job", Some(WORKER_TOKEN), None).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn claim_returns_oldest_job_as_running() {
    let app = build_test_app(memory_store());
    let first = submit(&app).await;
    let second = submit(&app).await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/next-queued-job")
        .header("authorization", format!("Bearer {}", WORKER_TOKEN))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let claimed = body_json(response).await;
    assert_eq!(claimed["job_id"], first.as_str());
    assert_eq!(claimed["state"], "running");

    assert_eq!(fetch(&app, &first).await["state"], "running");
    assert_eq!(fetch(&app, &second).await["state"], "queued");
}

#[tokio::test]
async fn claim_reports_storage_failure() {
    let app = build_test_app(Arc::new(BrokenStore));
    let response = post_as_worker(app, "/next-queued-job", Some(WORKER_TOKEN), None).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn finish_marks_job_completed() {
    let store = memory_store();
    let app = build_test_app(store.clone());
    let job_id = submit(&app).await;

    let response = post_as_worker(
        app.clone(),
        "/finish-job",
        Some(WORKER_TOKEN),
        Some(json!({
            "job_id": job_id,
            "status": "completed",
            "result": {"optimized_source": "module top(); endmodule"}
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let job = store.find(&JobId::from(job_id)).await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Completed);
    assert_eq!(
        job.result.unwrap()["optimized_source"],
        "module top(); endmodule"
    );
}

#[tokio::test]
async fn finish_requires_terminal_status() {
    let app = build_test_app(memory_store());
    let job_id = submit(&app).await;

    let response = post_as_worker(
        app,
        "/finish-job",
        Some(WORKER_TOKEN),
        Some(json!({"job_id": job_id, "status": "running"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Invalid completion status: running"})
    );
}

// ---------------------------------------------------------------------------
// LLM relay and CORS
// ---------------------------------------------------------------------------

#[tokio::test]
async fn llm_relay_rejects_unknown_role() {
    let app = build_test_app(memory_store());
    let response = post_json(
        app,
        "/llm-orchestrator",
        json!({"role": "critic", "payload": {}}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Invalid role. Must be: planner, programmer, reviewer, evaluator"})
    );
}

#[tokio::test]
async fn llm_relay_answers_in_mock_mode() {
    let app = build_test_app(memory_store());
    let response = post_json(
        app.clone(),
        "/llm-orchestrator",
        json!({"role": "planner", "payload": {"source": "module m; endmodule"}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let reply = body_json(response).await;
    assert!(reply["candidates"].as_array().is_some_and(|c| !c.is_empty()));

    let response = post_json(
        app,
        "/llm-orchestrator",
        json!({"role": "evaluator", "payload": {"current_best": {"power": 1.2}}}),
    )
    .await;
    let reply = body_json(response).await;
    assert_eq!(reply["best"], json!({"power": 1.2}));
    assert_eq!(reply["stop"], false);
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let app = build_test_app(memory_store());
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/start-optimization")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let allow_origin = response
        .headers()
        .get("access-control-allow-origin")
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(allow_origin, "http://localhost:5173");
}

#[tokio::test]
async fn cors_wildcard_allows_any_origin_without_credentials() {
    let config = ApiConfig {
        allowed_origins: vec!["*".to_string()],
        ..common::test_config()
    };
    let app = build_test_app_with(memory_store(), config);
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/job/anything")
        .header("Origin", "https://studio.example.com")
        .header("Access-Control-Request-Method", "GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    assert!(headers.get("access-control-allow-credentials").is_none());
}
