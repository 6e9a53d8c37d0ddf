//! Evaluation settings passed explicitly into the engine.

use serde::{Deserialize, Serialize};

/// Options recognized by the evaluator, aggregator and journey reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Absolute tolerance when comparing numerical answers.
    #[serde(default = "default_nat_tolerance")]
    pub nat_tolerance: f64,
    /// Abort scoring when any answer-key entry is missing or unparsable.
    #[serde(default)]
    pub require_complete_key: bool,
    /// Countdown start used when a session has neither a `testStarted`
    /// event nor a configured duration.
    #[serde(default = "default_duration")]
    pub default_duration_secs: u64,
}

fn default_nat_tolerance() -> f64 {
    1e-9
}

fn default_duration() -> u64 {
    3 * 60 * 60
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            nat_tolerance: default_nat_tolerance(),
            require_complete_key: false,
            default_duration_secs: default_duration(),
        }
    }
}
