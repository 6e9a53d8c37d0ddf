//! Answer key loading and validation.
//!
//! A key maps subject → section → question id → the raw answer text that
//! `answer::parse_answer` understands. Keys are written as TOML:
//!
//! ```toml
//! [key]
//! name = "Mock Test 3"
//!
//! [answers.Physics."Section A"]
//! 1 = "B"
//! 2 = "ACD"
//! 3 = "5 TO 10"
//! ```
//!
//! or as JSON with the same shape.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::answer::parse_answer;
use crate::model::TestSession;

/// Intermediate structure shared by the TOML and JSON key formats.
#[derive(Debug, Deserialize)]
struct RawKeyFile {
    #[serde(default)]
    key: RawKeyHeader,
    #[serde(default)]
    answers: BTreeMap<String, BTreeMap<String, BTreeMap<String, RawAnswer>>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawKeyHeader {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAnswer {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl RawAnswer {
    fn into_text(self) -> String {
        match self {
            RawAnswer::Text(text) => text,
            RawAnswer::Integer(v) => v.to_string(),
            RawAnswer::Float(v) => v.to_string(),
        }
    }
}

/// Raw answer-key texts of one test.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerKey {
    pub name: Option<String>,
    answers: BTreeMap<String, BTreeMap<String, BTreeMap<u32, String>>>,
}

impl AnswerKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            answers: BTreeMap::new(),
        }
    }

    /// Set the answer text of a question, replacing any previous entry.
    pub fn insert(
        &mut self,
        subject: impl Into<String>,
        section: impl Into<String>,
        question_id: u32,
        text: impl Into<String>,
    ) {
        self.answers
            .entry(subject.into())
            .or_default()
            .entry(section.into())
            .or_default()
            .insert(question_id, text.into());
    }

    /// Builder form of [`AnswerKey::insert`].
    pub fn with_answer(
        mut self,
        subject: impl Into<String>,
        section: impl Into<String>,
        question_id: u32,
        text: impl Into<String>,
    ) -> Self {
        self.insert(subject, section, question_id, text);
        self
    }

    pub fn answer_text(&self, subject: &str, section: &str, question_id: u32) -> Option<&str> {
        self.answers
            .get(subject)?
            .get(section)?
            .get(&question_id)
            .map(String::as_str)
    }

    /// Iterate over `(subject, section, question id, text)` entries.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, u32, &str)> {
        self.answers.iter().flat_map(|(subject, sections)| {
            sections.iter().flat_map(move |(section, texts)| {
                texts
                    .iter()
                    .map(move |(id, text)| (subject.as_str(), section.as_str(), *id, text.as_str()))
            })
        })
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn from_raw(raw: RawKeyFile, source_path: &Path) -> Result<AnswerKey> {
    let mut key = AnswerKey {
        name: raw.key.name,
        answers: BTreeMap::new(),
    };

    for (subject, sections) in raw.answers {
        for (section, texts) in sections {
            for (id, answer) in texts {
                let question_id: u32 = id.trim().parse().with_context(|| {
                    format!(
                        "question id {id:?} under {subject}/{section} is not a number: {}",
                        source_path.display()
                    )
                })?;
                key.insert(subject.clone(), section.clone(), question_id, answer.into_text());
            }
        }
    }

    Ok(key)
}

/// Parse a TOML answer key (useful for testing).
pub fn parse_answer_key_str(content: &str, source_path: &Path) -> Result<AnswerKey> {
    let raw: RawKeyFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
    from_raw(raw, source_path)
}

/// Parse a JSON answer key.
pub fn parse_answer_key_json(content: &str, source_path: &Path) -> Result<AnswerKey> {
    let raw: RawKeyFile = serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;
    from_raw(raw, source_path)
}

/// Load an answer key, choosing the format from the file extension.
pub fn load_answer_key(path: &Path) -> Result<AnswerKey> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer key: {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        parse_answer_key_json(&content, path)
    } else {
        parse_answer_key_str(&content, path)
    }
}

/// A question whose answer-key entry cannot be used for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyIssue {
    Missing {
        subject: String,
        section: String,
        question_id: u32,
    },
    Invalid {
        subject: String,
        section: String,
        question_id: u32,
        text: String,
    },
}

impl KeyIssue {
    pub fn question_id(&self) -> u32 {
        match self {
            KeyIssue::Missing { question_id, .. } | KeyIssue::Invalid { question_id, .. } => {
                *question_id
            }
        }
    }
}

impl fmt::Display for KeyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyIssue::Missing {
                subject,
                section,
                question_id,
            } => write!(f, "{subject}/{section} Q{question_id}: no answer-key entry"),
            KeyIssue::Invalid {
                subject,
                section,
                question_id,
                text,
            } => write!(
                f,
                "{subject}/{section} Q{question_id}: answer-key entry {text:?} does not parse"
            ),
        }
    }
}

/// A warning from answer-key validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub subject: Option<String>,
    pub section: Option<String>,
    pub question_id: Option<u32>,
    pub message: String,
}

impl ValidationWarning {
    fn key_level(message: impl Into<String>) -> Self {
        Self {
            subject: None,
            section: None,
            question_id: None,
            message: message.into(),
        }
    }

    fn question(subject: &str, section: &str, question_id: u32, message: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.to_string()),
            section: Some(section.to_string()),
            question_id: Some(question_id),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.subject, &self.section, self.question_id) {
            (Some(subject), Some(section), Some(id)) => {
                write!(f, "{subject}/{section} Q{id}: {}", self.message)
            }
            (_, _, Some(id)) => write!(f, "Q{id}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Validate an answer key, optionally against the session it will score.
pub fn validate_answer_key(key: &AnswerKey, session: Option<&TestSession>) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if key.is_empty() {
        warnings.push(ValidationWarning::key_level("answer key has no entries"));
    }

    for (subject, section, id, text) in key.entries() {
        if text.trim().is_empty() {
            warnings.push(ValidationWarning::question(subject, section, id, "answer text is empty"));
        }
    }

    let Some(session) = session else {
        return warnings;
    };

    let mut seen_ids = HashSet::new();
    for (_, _, question) in session.questions() {
        if !seen_ids.insert(question.id) {
            warnings.push(ValidationWarning {
                question_id: Some(question.id),
                ..ValidationWarning::key_level(format!(
                    "duplicate question id {} in session",
                    question.id
                ))
            });
        }
    }

    let mut known = HashSet::new();
    for (subject, section, question) in session.questions() {
        known.insert((subject, section, question.id));

        let Some(text) = key.answer_text(subject, section, question.id) else {
            warnings.push(ValidationWarning::question(
                subject,
                section,
                question.id,
                "no answer-key entry",
            ));
            continue;
        };

        if !text.trim().is_empty() && parse_answer(text, &question.format).is_none() {
            warnings.push(ValidationWarning::question(
                subject,
                section,
                question.id,
                format!("{text:?} is not a valid {} answer", question.question_type()),
            ));
        }
    }

    for (subject, section, id, _) in key.entries() {
        if !known.contains(&(subject, section, id)) {
            warnings.push(ValidationWarning::question(
                subject,
                section,
                id,
                "entry has no matching question in the session",
            ));
        }
    }

    warnings
}
