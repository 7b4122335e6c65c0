//! Views over the opaque result payload
//!
//! Workers post whatever they have; clients only look for a handful of
//! well-known keys.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key whose presence marks the result as complete even if `state` lags
pub const COMPLETION_ARTIFACT_KEY: &str = "optimized_source";

/// Older workers publish the artifact under this key instead
pub const LEGACY_ARTIFACT_KEY: &str = "optimized_verilog";

pub const METRICS_KEY: &str = "metrics";

/// Recognizable parts of a (possibly partial) result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialResult {
    /// Optimized source text, if one has been produced
    pub artifact: Option<String>,
    /// Metrics block, if one has been produced
    pub metrics: Option<Value>,
}

impl PartialResult {
    /// Extract the known sub-fields of a result object
    pub fn from_result(result: &Value) -> Self {
        let artifact = [COMPLETION_ARTIFACT_KEY, LEGACY_ARTIFACT_KEY]
            .iter()
            .filter_map(|key| result.get(key).and_then(Value::as_str))
            .find(|text| !text.is_empty())
            .map(str::to_string);

        let metrics = result
            .get(METRICS_KEY)
            .filter(|m| m.is_object())
            .cloned();

        Self { artifact, metrics }
    }

    pub fn is_empty(&self) -> bool {
        self.artifact.is_none() && self.metrics.is_none()
    }
}

/// Whether the result already carries the completion artifact
pub fn has_completion_artifact(result: &Value) -> bool {
    result
        .get(COMPLETION_ARTIFACT_KEY)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}
