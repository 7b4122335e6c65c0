//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::spec::OptimizationSpec;
use crate::dto::job::JobUpdate;
use crate::merge::merge_patch;

/// Opaque job identifier
///
/// Assigned by the backend at submission time and used as the only
/// correlation key between submission, polling and worker callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state of a job
///
/// States only move forward: `queued -> running -> completed | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    #[serde(alias = "succeeded")]
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            JobState::Queued => 0,
            JobState::Running => 1,
            JobState::Completed | JobState::Failed => 2,
        }
    }

    /// Whether moving from `self` to `next` is a forward transition.
    ///
    /// Same-state updates and anything leaving a terminal state are not.
    pub fn can_advance_to(self, next: JobState) -> bool {
        next.rank() > self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    /// Parse the storage representation, accepting the worker's `succeeded` alias
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobState::Queued),
            "running" => Some(JobState::Running),
            "completed" | "succeeded" => Some(JobState::Completed),
            "failed" => Some(JobState::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optimization job record
///
/// Created by the submission path, mutated only by worker claims and
/// callbacks, read-only for the submitting client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub state: JobState,
    pub spec: OptimizationSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_tail: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What happened to the state field when an update was merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Unchanged,
    Advanced { from: JobState, to: JobState },
    /// A backward or post-terminal transition was requested and ignored
    Ignored { current: JobState, requested: JobState },
}

impl Job {
    /// Build a freshly queued job
    pub fn queued(spec: OptimizationSpec) -> Self {
        let now = Utc::now();
        Self {
            job_id: JobId::generate(),
            state: JobState::Queued,
            spec,
            result: None,
            iteration: None,
            logs_tail: None,
            metadata: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a worker update into this record.
    ///
    /// Fields merge last-write-wins; `result` and `metadata` use JSON
    /// merge-patch so partial payloads accumulate. The state only moves
    /// forward. `updated_at` is stamped with `now` regardless.
    pub fn apply_update(&mut self, update: &JobUpdate, now: DateTime<Utc>) -> StateChange {
        let change = match update.state {
            None => StateChange::Unchanged,
            Some(requested) if requested == self.state => StateChange::Unchanged,
            Some(requested) if self.state.can_advance_to(requested) => {
                let from = self.state;
                self.state = requested;
                StateChange::Advanced {
                    from,
                    to: requested,
                }
            }
            Some(requested) => StateChange::Ignored {
                current: self.state,
                requested,
            },
        };

        if let Some(patch) = &update.result {
            let mut target = self.result.take().unwrap_or(Value::Null);
            merge_patch(&mut target, patch);
            self.result = (!target.is_null()).then_some(target);
        }

        if let Some(iteration) = update.iteration {
            self.iteration = Some(iteration);
        }

        if let Some(logs_tail) = &update.logs_tail {
            self.logs_tail = Some(logs_tail.clone());
        }

        if !update.metadata.is_empty() {
            let mut target = Value::Object(std::mem::take(&mut self.metadata));
            merge_patch(&mut target, &Value::Object(update.metadata.clone()));
            if let Value::Object(map) = target {
                self.metadata = map;
            }
        }

        self.updated_at = now;
        change
    }
}
