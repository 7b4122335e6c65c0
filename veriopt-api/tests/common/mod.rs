#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use veriopt_api::config::LlmConfig;
use veriopt_api::repository::{JobStore, MemoryJobStore, Reconciled, StoreError};
use veriopt_api::service::llm_service::LlmClient;
use veriopt_api::{ApiConfig, AppState, create_router};
use veriopt_core::domain::job::{Job, JobId};
use veriopt_core::dto::job::JobUpdate;

pub const WORKER_TOKEN: &str = "test-token";

/// Test configuration: in-memory store, fixed worker secret, mocked LLM relay.
pub fn test_config() -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        database_url: None,
        worker_token: WORKER_TOKEN.to_string(),
        allowed_origins: vec!["http://localhost:5173".to_string()],
        llm: LlmConfig {
            mock: true,
            ..LlmConfig::default()
        },
    }
}

/// Build the full router over the given store.
pub fn build_test_app(store: Arc<dyn JobStore>) -> Router {
    build_test_app_with(store, test_config())
}

pub fn build_test_app_with(store: Arc<dyn JobStore>, config: ApiConfig) -> Router {
    let llm = LlmClient::new(config.llm.clone()).unwrap();
    create_router(AppState::new(store, config, llm))
}

pub fn memory_store() -> Arc<MemoryJobStore> {
    Arc::new(MemoryJobStore::new())
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST with an optional bearer token and an optional JSON body.
pub async fn post_as_worker(
    app: Router,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(Method::POST).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.oneshot(request).await.unwrap()
}

/// Store wrapper that counts every call reaching storage.
pub struct CountingStore {
    inner: MemoryJobStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryJobStore::new(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl JobStore for CountingStore {
    async fn insert(&self, job: &Job) -> Result<(), StoreError> {
        self.hit();
        self.inner.insert(job).await
    }

    async fn find(&self, job_id: &JobId) -> Result<Option<Job>, StoreError> {
        self.hit();
        self.inner.find(job_id).await
    }

    async fn apply_update(
        &self,
        job_id: &JobId,
        update: &JobUpdate,
    ) -> Result<Option<Reconciled>, StoreError> {
        self.hit();
        self.inner.apply_update(job_id, update).await
    }

    async fn claim_next(&self) -> Result<Option<Job>, StoreError> {
        self.hit();
        self.inner.claim_next().await
    }
}

/// Store whose every operation fails with a database error.
pub struct BrokenStore;

#[async_trait]
impl JobStore for BrokenStore {
    async fn insert(&self, _job: &Job) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn find(&self, _job_id: &JobId) -> Result<Option<Job>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn apply_update(
        &self,
        _job_id: &JobId,
        _update: &JobUpdate,
    ) -> Result<Option<Reconciled>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn claim_next(&self) -> Result<Option<Job>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}
