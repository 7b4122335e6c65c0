//! LLM relay DTOs

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Agent role the relay prompts the model as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    Planner,
    Programmer,
    Reviewer,
    Evaluator,
}

impl LlmRole {
    pub const ALL: [LlmRole; 4] = [
        LlmRole::Planner,
        LlmRole::Programmer,
        LlmRole::Reviewer,
        LlmRole::Evaluator,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LlmRole::Planner => "planner",
            LlmRole::Programmer => "programmer",
            LlmRole::Reviewer => "reviewer",
            LlmRole::Evaluator => "evaluator",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == s)
    }
}

impl std::fmt::Display for LlmRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /llm-orchestrator`
///
/// The role is kept as a string so an unknown role produces a readable 400
/// instead of a generic deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub role: String,
    #[serde(default)]
    pub payload: Value,
}
