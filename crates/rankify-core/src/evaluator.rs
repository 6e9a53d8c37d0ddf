//! Scores a single question against its correct answer.

use std::collections::{BTreeMap, BTreeSet};

use crate::answer::{CorrectAnswer, NatClause};
use crate::config::EvaluationConfig;
use crate::error::ScoreError;
use crate::model::{AnswerFormat, Question, RecordedAnswer};
use crate::results::{QuestionResult, ResultStatus};

/// Evaluate the candidate's recorded answer for `question` against `correct`.
///
/// Deterministic and side-effect free. Dropped questions award full marks to
/// everyone; bonus questions only to attempts. A correct answer whose kind
/// cannot score the question type is a contract violation.
pub fn evaluate(
    question: &Question,
    correct: &CorrectAnswer,
    config: &EvaluationConfig,
) -> Result<QuestionResult, ScoreError> {
    match correct {
        CorrectAnswer::Dropped => {
            return Ok(QuestionResult::new(
                ResultStatus::Dropped,
                question.full_marks(),
                0.0,
            ))
        }
        CorrectAnswer::Bonus => {
            return Ok(if question.status.is_attempted() {
                QuestionResult::new(ResultStatus::Bonus, question.full_marks(), 0.0)
            } else {
                QuestionResult::not_answered()
            })
        }
        _ => {}
    }

    let recorded = match &question.answer {
        Some(answer) if question.status.is_attempted() => answer,
        _ => return Ok(QuestionResult::not_answered()),
    };

    let mismatch = || ScoreError::RecordedAnswerMismatch {
        question_id: question.id,
        question_type: question.question_type(),
    };

    match (question.format, correct) {
        (AnswerFormat::Mcq { .. }, CorrectAnswer::Options(accepted)) => {
            let selection = recorded.as_selection().ok_or_else(mismatch)?;
            Ok(evaluate_mcq(question, &selection, accepted))
        }
        (AnswerFormat::Msq { .. }, CorrectAnswer::Options(accepted)) => {
            let selection = recorded.as_selection().ok_or_else(mismatch)?;
            Ok(evaluate_msq(question, &selection, accepted))
        }
        (AnswerFormat::Nat, CorrectAnswer::Numeric(clauses)) => match recorded {
            RecordedAnswer::Text(text) if text.trim().is_empty() => Ok(QuestionResult::not_answered()),
            // typed text that is not a number is a wrong answer
            RecordedAnswer::Text(text) => Ok(match text.trim().parse::<f64>() {
                Ok(value) => evaluate_nat(question, value, clauses, config.nat_tolerance),
                Err(_) => incorrect(question),
            }),
            _ => {
                let value = recorded.as_number().ok_or_else(mismatch)?;
                Ok(evaluate_nat(question, value, clauses, config.nat_tolerance))
            }
        },
        (AnswerFormat::Msm { .. }, CorrectAnswer::Matrix(mapping)) => {
            let rows = recorded.as_matrix().ok_or_else(mismatch)?;
            Ok(evaluate_msm(question, &rows, mapping))
        }
        _ => Err(ScoreError::AnswerKindMismatch {
            question_id: question.id,
            question_type: question.question_type(),
            answer: correct.kind(),
        }),
    }
}

fn correct(question: &Question) -> QuestionResult {
    QuestionResult::new(ResultStatus::Correct, question.marks.correct, 1.0)
}

fn incorrect(question: &Question) -> QuestionResult {
    QuestionResult::new(ResultStatus::Incorrect, question.marks.incorrect, 0.0)
}

/// Any one of several accepted options counts as correct.
fn evaluate_mcq(question: &Question, selection: &BTreeSet<u32>, accepted: &[u32]) -> QuestionResult {
    let mut picked = selection.iter();
    match (picked.next(), picked.next()) {
        (None, _) => QuestionResult::not_answered(),
        (Some(option), None) if accepted.contains(option) => correct(question),
        _ => incorrect(question),
    }
}

/// A single option outside the key forfeits all partial credit.
fn evaluate_msq(question: &Question, selection: &BTreeSet<u32>, accepted: &[u32]) -> QuestionResult {
    if selection.is_empty() {
        return QuestionResult::not_answered();
    }

    let key: BTreeSet<u32> = accepted.iter().copied().collect();
    if *selection == key {
        correct(question)
    } else if selection.is_subset(&key) {
        let chosen = selection.len() as f64;
        let marks = question.marks.partial.unwrap_or(0.0) * chosen;
        QuestionResult::new(ResultStatus::Partial, marks, chosen / key.len() as f64)
    } else {
        incorrect(question)
    }
}

fn evaluate_nat(question: &Question, value: f64, clauses: &[NatClause], tolerance: f64) -> QuestionResult {
    if clauses.iter().any(|clause| clause.matches(value, tolerance)) {
        correct(question)
    } else {
        incorrect(question)
    }
}

/// Rows are all-or-nothing; the question is correct only when every keyed
/// row matches exactly.
fn evaluate_msm(
    question: &Question,
    rows: &[BTreeSet<u32>],
    mapping: &BTreeMap<u32, BTreeSet<u32>>,
) -> QuestionResult {
    if rows.iter().all(BTreeSet::is_empty) {
        return QuestionResult::not_answered();
    }

    let empty = BTreeSet::new();
    let correct_rows = mapping
        .iter()
        .filter(|(row, columns)| {
            let chosen = row
                .checked_sub(1)
                .and_then(|i| rows.get(i as usize))
                .unwrap_or(&empty);
            chosen == *columns
        })
        .count();
    let total_rows = mapping.len();
    let incorrect_rows = total_rows - correct_rows;

    let marks = correct_rows as f64 * question.marks.correct
        + incorrect_rows as f64 * question.marks.incorrect;
    let accuracy = correct_rows as f64 / total_rows.max(1) as f64;
    let status = if incorrect_rows == 0 {
        ResultStatus::Correct
    } else {
        ResultStatus::Incorrect
    };

    QuestionResult::new(status, marks, accuracy)
}
