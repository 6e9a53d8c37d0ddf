//! Test report types with JSON persistence and attempt comparison.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answer_key::KeyIssue;
use crate::journey::TemporalTrace;
use crate::model::{QuestionStatus, QuestionType};
use crate::results::{QuestionResult, ResultStatus};
use crate::statistics::{Stats, TestStats};

/// A complete scored test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub test: TestSummary,
    /// One entry per question, in session order.
    pub questions: Vec<QuestionOutcome>,
    pub stats: TestStats,
    pub journey: TemporalTrace,
    /// Questions left unscored because of answer-key gaps.
    #[serde(default)]
    pub key_issues: Vec<KeyIssue>,
}

/// Summary of the scored test (without the recorded answers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSummary {
    pub name: String,
    pub question_count: usize,
    pub duration_secs: u64,
}

/// How a single question was scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub subject: String,
    pub section: String,
    pub question_id: u32,
    pub question_type: QuestionType,
    pub status: QuestionStatus,
    pub time_spent_secs: f64,
    /// The answer-key entry, in canonical form when it parsed.
    pub correct_answer: Option<String>,
    /// `None` when the question could not be scored.
    pub result: Option<QuestionResult>,
}

impl QuestionOutcome {
    pub fn result_status(&self) -> Option<ResultStatus> {
        self.result.map(|r| r.status)
    }

    pub fn marks_awarded(&self) -> f64 {
        self.result.map_or(0.0, |r| r.marks_awarded)
    }
}

impl TestReport {
    pub fn total_marks(&self) -> f64 {
        self.stats.overall.marks.total
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: TestReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this attempt against a baseline attempt.
    ///
    /// A subject (or the overall score) regresses when its marks drop by
    /// more than `threshold`.
    pub fn compare(&self, baseline: &TestReport, threshold: f64) -> AttemptComparison {
        let overall = ScoreDelta::between("overall", &baseline.stats.overall, &self.stats.overall);

        let baseline_subjects: BTreeMap<&str, &Stats> = baseline
            .stats
            .subjects
            .iter()
            .map(|s| (s.name.as_str(), &s.stats))
            .collect();
        let current_subjects: BTreeSet<&str> =
            self.stats.subjects.iter().map(|s| s.name.as_str()).collect();

        let mut subjects = Vec::new();
        let mut new_subjects = Vec::new();
        for subject in &self.stats.subjects {
            match baseline_subjects.get(subject.name.as_str()) {
                Some(before) => {
                    subjects.push(ScoreDelta::between(&subject.name, before, &subject.stats))
                }
                None => new_subjects.push(subject.name.clone()),
            }
        }
        let removed_subjects = baseline_subjects
            .keys()
            .filter(|name| !current_subjects.contains(*name))
            .map(|name| name.to_string())
            .collect();

        let baseline_questions: BTreeMap<(&str, &str, u32), &QuestionOutcome> = baseline
            .questions
            .iter()
            .map(|q| ((q.subject.as_str(), q.section.as_str(), q.question_id), q))
            .collect();

        let mut question_changes = Vec::new();
        for current in &self.questions {
            let key = (current.subject.as_str(), current.section.as_str(), current.question_id);
            let Some(before) = baseline_questions.get(&key) else {
                continue;
            };
            if before.result_status() != current.result_status() {
                question_changes.push(QuestionChange {
                    subject: current.subject.clone(),
                    section: current.section.clone(),
                    question_id: current.question_id,
                    baseline: before.result_status(),
                    current: current.result_status(),
                    marks_delta: current.marks_awarded() - before.marks_awarded(),
                });
            }
        }

        AttemptComparison {
            baseline_id: baseline.id,
            current_id: self.id,
            threshold,
            overall,
            subjects,
            question_changes,
            new_subjects,
            removed_subjects,
        }
    }
}

/// Marks and accuracy of one scope in two attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreDelta {
    pub name: String,
    pub baseline_marks: f64,
    pub current_marks: f64,
    pub marks_delta: f64,
    pub baseline_accuracy: f64,
    pub current_accuracy: f64,
    pub accuracy_delta: f64,
}

impl ScoreDelta {
    fn between(name: &str, baseline: &Stats, current: &Stats) -> Self {
        Self {
            name: name.to_string(),
            baseline_marks: baseline.marks.total,
            current_marks: current.marks.total,
            marks_delta: current.marks.total - baseline.marks.total,
            baseline_accuracy: baseline.accuracy.percentage,
            current_accuracy: current.accuracy.percentage,
            accuracy_delta: current.accuracy.percentage - baseline.accuracy.percentage,
        }
    }
}

/// A question whose result status differs between attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionChange {
    pub subject: String,
    pub section: String,
    pub question_id: u32,
    pub baseline: Option<ResultStatus>,
    pub current: Option<ResultStatus>,
    pub marks_delta: f64,
}

/// Result of comparing two attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptComparison {
    pub baseline_id: Uuid,
    pub current_id: Uuid,
    /// Marks drop tolerated before a scope counts as regressed.
    pub threshold: f64,
    pub overall: ScoreDelta,
    /// Subjects present in both attempts.
    pub subjects: Vec<ScoreDelta>,
    pub question_changes: Vec<QuestionChange>,
    /// Subjects in current but not baseline.
    pub new_subjects: Vec<String>,
    /// Subjects in baseline but not current.
    pub removed_subjects: Vec<String>,
}

fn status_label(status: Option<ResultStatus>) -> String {
    status.map_or_else(|| "unscored".to_string(), |s| s.to_string())
}

impl AttemptComparison {
    /// The overall score and subjects whose marks dropped beyond the threshold.
    pub fn regressions(&self) -> Vec<&ScoreDelta> {
        std::iter::once(&self.overall)
            .chain(&self.subjects)
            .filter(|d| d.marks_delta < -self.threshold)
            .collect()
    }

    pub fn improvements(&self) -> Vec<&ScoreDelta> {
        std::iter::once(&self.overall)
            .chain(&self.subjects)
            .filter(|d| d.marks_delta > self.threshold)
            .collect()
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions().is_empty()
    }

    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {:.2} -> {:.2} marks ({:+.2}), accuracy {:.2}% -> {:.2}% ({:+.2})\n\n",
            self.overall.baseline_marks,
            self.overall.current_marks,
            self.overall.marks_delta,
            self.overall.baseline_accuracy,
            self.overall.current_accuracy,
            self.overall.accuracy_delta
        ));

        let regressions = self.regressions();
        if !regressions.is_empty() {
            md.push_str("### Regressions\n\n");
            md.push_str(&format!(
                "{} scope(s) dropped by more than {:.2} marks: {}\n\n",
                regressions.len(),
                self.threshold,
                regressions
                    .iter()
                    .map(|d| d.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        if !self.subjects.is_empty() {
            md.push_str("### Subjects\n\n");
            md.push_str("| Subject | Baseline | Current | Delta | Accuracy delta |\n");
            md.push_str("|---------|----------|---------|-------|----------------|\n");
            for d in &self.subjects {
                md.push_str(&format!(
                    "| {} | {:.2} | {:.2} | {:+.2} | {:+.2}% |\n",
                    d.name, d.baseline_marks, d.current_marks, d.marks_delta, d.accuracy_delta
                ));
            }
            md.push('\n');
        }

        if !self.question_changes.is_empty() {
            md.push_str("### Changed questions\n\n");
            md.push_str("| Subject | Section | Question | Baseline | Current | Marks |\n");
            md.push_str("|---------|---------|----------|----------|---------|-------|\n");
            for c in &self.question_changes {
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {} | {:+.2} |\n",
                    c.subject,
                    c.section,
                    c.question_id,
                    status_label(c.baseline),
                    status_label(c.current),
                    c.marks_delta
                ));
            }
            md.push('\n');
        }

        if !self.new_subjects.is_empty() {
            md.push_str(&format!("New subjects: {}\n", self.new_subjects.join(", ")));
        }
        if !self.removed_subjects.is_empty() {
            md.push_str(&format!(
                "Removed subjects: {}\n",
                self.removed_subjects.join(", ")
            ));
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer_key::AnswerKey;
    use crate::engine::ResultEngine;
    use crate::model::TestSession;

    fn session(physics: [u32; 2], chemistry: u32) -> TestSession {
        serde_json::from_str(&format!(
            r#"{{
                "name": "Mock",
                "duration_secs": 300,
                "subjects": [
                    {{"name": "Physics", "sections": [{{"name": "A", "questions": [
                        {{"id": 1, "type": "MCQ", "options": 4, "status": "answered", "answer": {}}},
                        {{"id": 2, "type": "MCQ", "options": 4, "status": "answered", "answer": {}}}
                    ]}}]}},
                    {{"name": "Chemistry", "sections": [{{"name": "A", "questions": [
                        {{"id": 3, "type": "MCQ", "options": 4, "status": "answered", "answer": {}}}
                    ]}}]}}
                ]
            }}"#,
            physics[0], physics[1], chemistry
        ))
        .unwrap()
    }

    fn report(physics: [u32; 2], chemistry: u32) -> TestReport {
        let key = AnswerKey::new("Mock")
            .with_answer("Physics", "A", 1, "A")
            .with_answer("Physics", "A", 2, "B")
            .with_answer("Chemistry", "A", 3, "C");
        ResultEngine::default()
            .score(&session(physics, chemistry), &key)
            .unwrap()
    }

    #[test]
    fn compare_identical_reports() {
        let baseline = report([1, 2], 3);
        let current = report([1, 2], 3);

        let comparison = current.compare(&baseline, 0.0);
        assert!(!comparison.has_regressions());
        assert!(comparison.improvements().is_empty());
        assert!(comparison.question_changes.is_empty());
        assert_eq!(comparison.subjects.len(), 2);
    }

    #[test]
    fn compare_with_regression() {
        let baseline = report([1, 2], 3);
        let current = report([1, 3], 3);

        let comparison = current.compare(&baseline, 0.5);
        assert!(comparison.has_regressions());
        let names: Vec<_> = comparison.regressions().iter().map(|d| d.name.clone()).collect();
        assert_eq!(names, vec!["overall", "Physics"]);
        assert_eq!(comparison.overall.marks_delta, -5.0);

        let change = &comparison.question_changes[0];
        assert_eq!(change.question_id, 2);
        assert_eq!(change.baseline, Some(ResultStatus::Correct));
        assert_eq!(change.current, Some(ResultStatus::Incorrect));
    }

    #[test]
    fn threshold_absorbs_small_drops() {
        let baseline = report([1, 2], 3);
        let current = report([1, 2], 1);
        assert!(current.compare(&baseline, 5.0).regressions().is_empty());
        assert!(current.compare(&baseline, 1.0).has_regressions());
    }

    #[test]
    fn compare_with_new_and_removed_subjects() {
        let baseline = report([1, 2], 3);
        let mut current = report([1, 2], 3);
        current.stats.subjects[1].name = "Biology".into();

        let comparison = current.compare(&baseline, 0.0);
        assert_eq!(comparison.new_subjects, vec!["Biology"]);
        assert_eq!(comparison.removed_subjects, vec!["Chemistry"]);
    }

    #[test]
    fn json_roundtrip() {
        let report = report([1, 4], 3);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = TestReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.questions.len(), 3);
        assert_eq!(loaded.stats, report.stats);
        assert_eq!(loaded.journey, report.journey);
    }

    #[test]
    fn markdown_output() {
        let baseline = report([1, 2], 3);
        let current = report([2, 2], 3);

        let md = current.compare(&baseline, 0.0).to_markdown();
        assert!(md.contains("Regressions"));
        assert!(md.contains("| Physics |"));
        assert!(md.contains("correct | incorrect"));
    }
}
