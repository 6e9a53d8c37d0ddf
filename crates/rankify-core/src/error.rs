//! Scoring error types.
//!
//! Answer-key gaps are recoverable at the workflow level: the caller prompts
//! for a key and scores again. Mismatched answer shapes mean the session or
//! key is corrupt and scoring stops rather than awarding a silent zero.

use thiserror::Error;

use crate::answer_key::KeyIssue;
use crate::model::QuestionType;

/// Errors that can occur while scoring a test.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// No answer key entries were supplied at all.
    #[error("answer key is empty")]
    EmptyAnswerKey,

    /// Some questions have no usable answer-key entry.
    #[error("answer key incomplete: {} question(s) missing or invalid", .issues.len())]
    IncompleteAnswerKey { issues: Vec<KeyIssue> },

    /// The parsed answer cannot score a question of this type.
    #[error("question {question_id}: a {answer} answer cannot score a {question_type} question")]
    AnswerKindMismatch {
        question_id: u32,
        question_type: QuestionType,
        answer: &'static str,
    },

    /// The recorded answer has a shape that does not belong to the question type.
    #[error("question {question_id}: recorded answer does not fit a {question_type} question")]
    RecordedAnswerMismatch {
        question_id: u32,
        question_type: QuestionType,
    },
}

impl ScoreError {
    /// Returns `true` if supplying a better answer key can resolve the error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScoreError::EmptyAnswerKey | ScoreError::IncompleteAnswerKey { .. }
        )
    }
}
