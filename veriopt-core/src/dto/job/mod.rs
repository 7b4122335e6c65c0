//! Job DTOs for client, backend and worker communication

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::job::{JobId, JobState};
use crate::domain::spec::OptimizationSpec;

/// Body of `POST /start-optimization`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartOptimization {
    pub spec: OptimizationSpec,
}

/// Reply of `POST /start-optimization`
///
/// `job_id` is optional on the wire so a client can tell a malformed reply
/// apart from a transport failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartOptimizationResponse {
    #[serde(default)]
    pub job_id: Option<JobId>,
}

/// Partial update posted by a worker to the callback endpoint
///
/// Known fields are typed; anything else is kept in `metadata` and merged
/// into the job's metadata document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    #[serde(default)]
    pub job_id: Option<JobId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<JobState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_tail: Option<String>,

    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl JobUpdate {
    pub fn for_job(job_id: JobId) -> Self {
        Self {
            job_id: Some(job_id),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: JobState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_iteration(mut self, iteration: u32) -> Self {
        self.iteration = Some(iteration);
        self
    }

    pub fn with_logs_tail(mut self, logs_tail: impl Into<String>) -> Self {
        self.logs_tail = Some(logs_tail.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// The correlation key, if present and not blank
    pub fn correlation_key(&self) -> Option<&JobId> {
        self.job_id.as_ref().filter(|id| !id.is_blank())
    }
}

/// Body of `POST /finish-job`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishJob {
    pub job_id: JobId,
    pub status: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl From<FinishJob> for JobUpdate {
    fn from(req: FinishJob) -> Self {
        JobUpdate {
            job_id: Some(req.job_id),
            state: Some(req.status),
            result: req.result,
            ..JobUpdate::default()
        }
    }
}

/// Generic `{"ok": true}` acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub const OK: Ack = Ack { ok: true };
}
