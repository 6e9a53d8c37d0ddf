//! Per-question result types produced by the evaluator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome category of a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultStatus {
    Correct,
    Incorrect,
    Partial,
    Bonus,
    Dropped,
    NotAnswered,
    /// Excluded by the optional-questions rule; contributes to nothing.
    NotConsidered,
}

impl ResultStatus {
    /// Returns `true` if the status counts toward the accuracy denominator.
    pub fn counts_toward_accuracy(self) -> bool {
        matches!(
            self,
            ResultStatus::Correct | ResultStatus::Incorrect | ResultStatus::Partial
        )
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResultStatus::Correct => "correct",
            ResultStatus::Incorrect => "incorrect",
            ResultStatus::Partial => "partial",
            ResultStatus::Bonus => "bonus",
            ResultStatus::Dropped => "dropped",
            ResultStatus::NotAnswered => "not answered",
            ResultStatus::NotConsidered => "not considered",
        };
        f.write_str(label)
    }
}

/// The scored outcome of one question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub status: ResultStatus,
    pub marks_awarded: f64,
    /// Fractional credit in `0.0..=1.0` used for the accuracy metric.
    pub accuracy_numerator: f64,
}

impl QuestionResult {
    pub fn new(status: ResultStatus, marks_awarded: f64, accuracy_numerator: f64) -> Self {
        Self {
            status,
            marks_awarded,
            accuracy_numerator,
        }
    }

    pub fn not_answered() -> Self {
        Self::new(ResultStatus::NotAnswered, 0.0, 0.0)
    }

    pub fn not_considered() -> Self {
        Self::new(ResultStatus::NotConsidered, 0.0, 0.0)
    }
}
