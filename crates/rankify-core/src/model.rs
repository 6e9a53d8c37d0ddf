//! Core data model types for Rankify.
//!
//! These types describe a finished CBT session as the test-taking interface
//! records it: subjects, sections, questions with their recorded answers and
//! timings, and the countdown-stamped event log.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four supported question formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuestionType {
    /// Multiple choice, one option is marked.
    Mcq,
    /// Multiple select, any subset of options is marked.
    Msq,
    /// Numerical answer typed in by the candidate.
    Nat,
    /// Multiple select matrix: each row maps to a set of columns.
    Msm,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Mcq => write!(f, "MCQ"),
            QuestionType::Msq => write!(f, "MSQ"),
            QuestionType::Nat => write!(f, "NAT"),
            QuestionType::Msm => write!(f, "MSM"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mcq" => Ok(QuestionType::Mcq),
            "msq" => Ok(QuestionType::Msq),
            "nat" | "numerical" => Ok(QuestionType::Nat),
            "msm" | "matrix" => Ok(QuestionType::Msm),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Option geometry of a question, one variant per question type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum AnswerFormat {
    Mcq { options: u32 },
    Msq { options: u32 },
    Nat,
    Msm { rows: u32, columns: u32 },
}

impl AnswerFormat {
    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerFormat::Mcq { .. } => QuestionType::Mcq,
            AnswerFormat::Msq { .. } => QuestionType::Msq,
            AnswerFormat::Nat => QuestionType::Nat,
            AnswerFormat::Msm { .. } => QuestionType::Msm,
        }
    }
}

/// Palette status of a question when the test was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionStatus {
    Answered,
    NotAnswered,
    Marked,
    MarkedAnswered,
    NotVisited,
}

impl QuestionStatus {
    pub const ALL: [QuestionStatus; 5] = [
        QuestionStatus::Answered,
        QuestionStatus::NotAnswered,
        QuestionStatus::Marked,
        QuestionStatus::MarkedAnswered,
        QuestionStatus::NotVisited,
    ];

    /// Returns `true` if the candidate saved an answer for the question.
    pub fn is_attempted(self) -> bool {
        matches!(self, QuestionStatus::Answered | QuestionStatus::MarkedAnswered)
    }
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuestionStatus::Answered => "answered",
            QuestionStatus::NotAnswered => "not answered",
            QuestionStatus::Marked => "marked",
            QuestionStatus::MarkedAnswered => "marked & answered",
            QuestionStatus::NotVisited => "not visited",
        };
        f.write_str(label)
    }
}

/// Marking scheme of a single question.
///
/// For MSM questions `correct` and `incorrect` are awarded per row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marks {
    /// Marks for a fully correct answer (per row for MSM).
    pub correct: f64,
    /// Marks for a wrong answer, usually zero or negative (per row for MSM).
    #[serde(default)]
    pub incorrect: f64,
    /// Marks per correctly selected option in a partially correct MSQ answer.
    #[serde(default)]
    pub partial: Option<f64>,
    /// Overrides the marks awarded for bonus and dropped questions.
    #[serde(default)]
    pub max_awardable: Option<f64>,
}

impl Default for Marks {
    fn default() -> Self {
        Self {
            correct: 4.0,
            incorrect: -1.0,
            partial: None,
            max_awardable: None,
        }
    }
}

/// The answer a candidate recorded, as stored by the test interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordedAnswer {
    /// A single 1-based option index.
    Single(u32),
    /// A numeric value.
    Numeric(f64),
    /// A set of 1-based option indices.
    Selection(BTreeSet<u32>),
    /// Column selections per row; row `i` is stored at position `i - 1`.
    Matrix(Vec<BTreeSet<u32>>),
    /// Free text as typed, used by numerical inputs.
    Text(String),
}

impl RecordedAnswer {
    /// The answer as a set of option indices, if it has that shape.
    pub fn as_selection(&self) -> Option<BTreeSet<u32>> {
        match self {
            RecordedAnswer::Single(v) => Some(BTreeSet::from([*v])),
            RecordedAnswer::Selection(set) => Some(set.clone()),
            _ => None,
        }
    }

    /// The answer as a number, if it has that shape.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RecordedAnswer::Single(v) => Some(f64::from(*v)),
            RecordedAnswer::Numeric(v) => Some(*v),
            RecordedAnswer::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// The answer as per-row column selections, if it has that shape.
    ///
    /// An empty selection deserializes ambiguously and is read as an empty
    /// matrix.
    pub fn as_matrix(&self) -> Option<Vec<BTreeSet<u32>>> {
        match self {
            RecordedAnswer::Matrix(rows) => Some(rows.clone()),
            RecordedAnswer::Selection(set) if set.is_empty() => Some(Vec::new()),
            _ => None,
        }
    }
}

/// A single question of a submitted test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question id, unique within the test.
    pub id: u32,
    /// Type and option geometry.
    #[serde(flatten)]
    pub format: AnswerFormat,
    /// What the candidate recorded, if anything.
    #[serde(default)]
    pub answer: Option<RecordedAnswer>,
    /// Seconds the question was on screen.
    #[serde(default)]
    pub time_spent_secs: f64,
    /// Palette status at submission.
    pub status: QuestionStatus,
    /// Marking scheme.
    #[serde(default)]
    pub marks: Marks,
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        self.format.question_type()
    }

    /// Marks awarded when the question is dropped or declared bonus.
    pub fn full_marks(&self) -> f64 {
        if let Some(max) = self.marks.max_awardable {
            return max;
        }
        match self.format {
            AnswerFormat::Msm { rows, .. } => self.marks.correct * f64::from(rows),
            _ => self.marks.correct,
        }
    }
}

/// A section of a subject, optionally with questions only the best of which count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    /// Number of questions dropped from scoring by the optional-questions rule.
    #[serde(default)]
    pub optional_questions: u32,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// A subject grouping one or more sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// A submitted test with its recorded answers and event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSession {
    pub name: String,
    /// Configured test duration in seconds (0 when unknown).
    #[serde(default)]
    pub duration_secs: u64,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    /// Countdown-stamped events in the order they were appended.
    #[serde(default)]
    pub events: Vec<TestEvent>,
}

impl TestSession {
    /// Iterate over every question with its subject and section names.
    pub fn questions(&self) -> impl Iterator<Item = (&str, &str, &Question)> {
        self.subjects.iter().flat_map(|subject| {
            subject.sections.iter().flat_map(move |section| {
                section
                    .questions
                    .iter()
                    .map(move |q| (subject.name.as_str(), section.name.as_str(), q))
            })
        })
    }

    pub fn question_count(&self) -> usize {
        self.questions().count()
    }

    /// Load a session exported by the test interface.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse session JSON: {}", path.display()))
    }
}

/// What happened at a point of the test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TestEventKind {
    TestStarted,
    CurrentQuestion {
        question_id: u32,
    },
    #[serde(alias = "answeredSaved")]
    AnswerSaved {
        question_id: u32,
    },
    AnswerCleared {
        question_id: u32,
    },
    TestFinished,
}

/// An entry of the test event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEvent {
    #[serde(flatten)]
    pub kind: TestEventKind,
    /// Countdown timer reading in seconds when the event was appended.
    pub countdown_secs: f64,
    /// Wall-clock time, when the interface recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TestEvent {
    pub fn new(kind: TestEventKind, countdown_secs: f64) -> Self {
        Self {
            kind,
            countdown_secs,
            timestamp: None,
        }
    }
}
