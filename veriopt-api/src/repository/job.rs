//! Postgres Job Repository
//!
//! Handles all database operations related to optimization jobs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use veriopt_core::domain::job::{Job, JobId, JobState};
use veriopt_core::dto::job::JobUpdate;

use super::{JobStore, Reconciled, StoreError};

const COLUMNS: &str =
    "job_id, state, spec, result, iteration, logs_tail, metadata, created_at, updated_at";

/// Job store backed by the `optimization_jobs` table
#[derive(Debug, Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn insert(&self, job: &Job) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO optimization_jobs
                (job_id, state, spec, result, iteration, logs_tail, metadata, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(job.job_id.as_str())
        .bind(job.state.as_str())
        .bind(Json(&job.spec))
        .bind(&job.result)
        .bind(job.iteration.map(i64::from))
        .bind(&job.logs_tail)
        .bind(Json(&job.metadata))
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, job_id: &JobId) -> Result<Option<Job>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM optimization_jobs WHERE job_id = $1");
        let row = sqlx::query_as::<_, JobRow>(&query)
            .bind(job_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Job::try_from).transpose()
    }

    async fn apply_update(
        &self,
        job_id: &JobId,
        update: &JobUpdate,
    ) -> Result<Option<Reconciled>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes overlapping callbacks for the same job.
        let query =
            format!("SELECT {COLUMNS} FROM optimization_jobs WHERE job_id = $1 FOR UPDATE");
        let Some(row) = sqlx::query_as::<_, JobRow>(&query)
            .bind(job_id.as_str())
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let mut job = Job::try_from(row)?;
        let change = job.apply_update(update, Utc::now());

        sqlx::query(
            r#"
            UPDATE optimization_jobs
            SET state = $2, result = $3, iteration = $4, logs_tail = $5,
                metadata = $6, updated_at = $7
            WHERE job_id = $1
            "#,
        )
        .bind(job.job_id.as_str())
        .bind(job.state.as_str())
        .bind(&job.result)
        .bind(job.iteration.map(i64::from))
        .bind(&job.logs_tail)
        .bind(Json(&job.metadata))
        .bind(job.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(Reconciled { job, change }))
    }

    async fn claim_next(&self) -> Result<Option<Job>, StoreError> {
        // SKIP LOCKED keeps concurrent claimers from picking the same row.
        let query = format!(
            "UPDATE optimization_jobs \
             SET state = $1, updated_at = $2 \
             WHERE job_id = ( \
                 SELECT job_id FROM optimization_jobs \
                 WHERE state = $3 \
                 ORDER BY created_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, JobRow>(&query)
            .bind(JobState::Running.as_str())
            .bind(Utc::now())
            .bind(JobState::Queued.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Job::try_from).transpose()
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
    job_id: String,
    state: String,
    spec: Value,
    result: Option<Value>,
    iteration: Option<i64>,
    logs_tail: Option<String>,
    metadata: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt {
            job_id: row.job_id.clone(),
            reason,
        };

        let state = JobState::parse(&row.state)
            .ok_or_else(|| corrupt(format!("unknown state '{}'", row.state)))?;

        let spec = serde_json::from_value(row.spec)
            .map_err(|e| corrupt(format!("invalid spec: {e}")))?;

        let iteration = row
            .iteration
            .map(u32::try_from)
            .transpose()
            .map_err(|e| corrupt(format!("invalid iteration: {e}")))?;

        let metadata = match row.metadata {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => return Err(corrupt(format!("metadata is not an object: {other}"))),
        };

        Ok(Job {
            job_id: JobId::from(row.job_id),
            state,
            spec,
            result: row.result,
            iteration,
            logs_tail: row.logs_tail,
            metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
