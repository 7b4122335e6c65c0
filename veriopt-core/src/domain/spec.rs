//! Optimization request types
//!
//! The request is stored verbatim alongside the job and handed to the worker
//! that claims it. Unknown keys are kept so newer front ends can pass
//! engine-specific settings through without a schema change here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User submission: RTL source plus optimization targets and budgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSpec {
    /// Hardware-description source text
    pub source: String,

    #[serde(default)]
    pub options: TargetOptions,

    #[serde(default, skip_serializing_if = "Budgets::is_empty")]
    pub budgets: Budgets,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_module: Option<String>,

    /// Numeric targets such as `frequency_mhz`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which PPA metrics the optimizer should go after
///
/// Omitted flags take the same values as [`TargetOptions::default`], so an
/// absent `options` and `{}` mean the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOptions {
    #[serde(default = "enabled")]
    pub power: bool,
    #[serde(default = "enabled")]
    pub timing: bool,
    #[serde(default)]
    pub area: bool,
}

fn enabled() -> bool {
    true
}

impl Default for TargetOptions {
    fn default() -> Self {
        Self {
            power: true,
            timing: true,
            area: false,
        }
    }
}

impl TargetOptions {
    pub fn any(&self) -> bool {
        self.power || self.timing || self.area
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budgets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iters: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_parallel: Option<u32>,
}

impl Budgets {
    pub fn is_empty(&self) -> bool {
        self.max_iters.is_none() && self.max_parallel.is_none()
    }
}

impl OptimizationSpec {
    /// Spec with default targets and no budgets
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            options: TargetOptions::default(),
            budgets: Budgets::default(),
            top_module: None,
            targets: None,
            extra: Map::new(),
        }
    }

    pub fn with_options(mut self, options: TargetOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_iters(mut self, max_iters: u32) -> Self {
        self.budgets.max_iters = Some(max_iters);
        self
    }

    /// Checks the invariants the backend enforces before enqueueing
    pub fn validate(&self) -> Result<(), String> {
        if self.source.trim().is_empty() {
            return Err("spec.source must not be empty".to_string());
        }

        if !self.options.any() {
            return Err(
                "spec.options must enable at least one of power, timing or area".to_string(),
            );
        }

        if self.budgets.max_iters == Some(0) {
            return Err("spec.budgets.max_iters must be greater than 0".to_string());
        }

        if self.budgets.max_parallel == Some(0) {
            return Err("spec.budgets.max_parallel must be greater than 0".to_string());
        }

        Ok(())
    }
}
