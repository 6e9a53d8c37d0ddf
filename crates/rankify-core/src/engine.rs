//! Result engine orchestrator.
//!
//! Scores a submitted session against its answer key: applies the
//! optional-questions rule per section, evaluates every considered question,
//! aggregates the results and reconstructs the test journey.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::answer::parse_answer;
use crate::answer_key::{AnswerKey, KeyIssue};
use crate::config::EvaluationConfig;
use crate::error::ScoreError;
use crate::evaluator::evaluate;
use crate::journey::{reconstruct, JourneyLane};
use crate::model::{Question, Section, TestSession};
use crate::report::{QuestionOutcome, TestReport, TestSummary};
use crate::results::QuestionResult;
use crate::statistics::{
    aggregate, select_not_considered, SectionStats, SubjectStats, TestStats,
};

/// The central scoring engine.
#[derive(Debug, Clone, Default)]
pub struct ResultEngine {
    config: EvaluationConfig,
}

/// What scoring one section produced.
struct ScoredSection {
    outcomes: Vec<QuestionOutcome>,
    stats: SectionStats,
    issues: Vec<KeyIssue>,
}

impl ResultEngine {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Score `session` against `key`.
    ///
    /// Questions whose key entry is missing or unparsable are left unscored
    /// and reported in `key_issues`, unless `require_complete_key` is set,
    /// in which case scoring fails with [`ScoreError::IncompleteAnswerKey`].
    pub fn score(&self, session: &TestSession, key: &AnswerKey) -> Result<TestReport, ScoreError> {
        if key.is_empty() {
            return Err(ScoreError::EmptyAnswerKey);
        }

        let mut questions = Vec::with_capacity(session.question_count());
        let mut key_issues = Vec::new();
        let mut subjects = Vec::with_capacity(session.subjects.len());

        for subject in &session.subjects {
            let mut sections = Vec::with_capacity(subject.sections.len());
            for section in &subject.sections {
                let scored = self.score_section(&subject.name, section, key)?;
                questions.extend(scored.outcomes);
                key_issues.extend(scored.issues);
                sections.push(scored.stats);
            }
            subjects.push(SubjectStats::from_sections(subject.name.clone(), sections));
        }

        for issue in &key_issues {
            tracing::warn!("{issue}");
        }
        if self.config.require_complete_key && !key_issues.is_empty() {
            return Err(ScoreError::IncompleteAnswerKey { issues: key_issues });
        }

        let stats = TestStats::from_subjects(subjects);

        let mut lanes = BTreeMap::new();
        for outcome in &questions {
            let lane = outcome
                .result
                .map(|r| JourneyLane::from(r.status))
                .unwrap_or(JourneyLane::Unscored);
            if lanes.insert(outcome.question_id, lane).is_some() {
                tracing::warn!(
                    "question id {} appears more than once; journey uses the last one",
                    outcome.question_id
                );
            }
        }
        let fallback_start = if session.duration_secs > 0 {
            session.duration_secs
        } else {
            self.config.default_duration_secs
        };
        let journey = reconstruct(&session.events, &lanes, fallback_start as f64);

        tracing::info!(
            "scored '{}': {} questions, {:.2} marks, {:.2}% accuracy",
            session.name,
            questions.len(),
            stats.overall.marks.total,
            stats.overall.accuracy.percentage
        );

        Ok(TestReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            test: TestSummary {
                name: session.name.clone(),
                question_count: questions.len(),
                duration_secs: session.duration_secs,
            },
            questions,
            stats,
            journey,
            key_issues,
        })
    }

    fn score_section(
        &self,
        subject: &str,
        section: &Section,
        key: &AnswerKey,
    ) -> Result<ScoredSection, ScoreError> {
        let excluded = select_not_considered(&section.questions, section.optional_questions);
        tracing::debug!(
            "{subject}/{}: {} questions, {} excluded by optional rule",
            section.name,
            section.questions.len(),
            excluded.len()
        );

        let mut outcomes = Vec::with_capacity(section.questions.len());
        let mut issues = Vec::new();

        for (position, question) in section.questions.iter().enumerate() {
            let text = key.answer_text(subject, &section.name, question.id);
            let (correct_answer, result) = if excluded.contains(&position) {
                (text.map(str::to_string), Some(QuestionResult::not_considered()))
            } else {
                match text.map(|t| (t, parse_answer(t, &question.format))) {
                    None => {
                        issues.push(KeyIssue::Missing {
                            subject: subject.to_string(),
                            section: section.name.clone(),
                            question_id: question.id,
                        });
                        (None, None)
                    }
                    Some((raw, None)) => {
                        issues.push(KeyIssue::Invalid {
                            subject: subject.to_string(),
                            section: section.name.clone(),
                            question_id: question.id,
                            text: raw.to_string(),
                        });
                        (Some(raw.to_string()), None)
                    }
                    Some((_, Some(answer))) => {
                        let result = evaluate(question, &answer, &self.config)?;
                        (Some(answer.to_string()), Some(result))
                    }
                }
            };

            outcomes.push(outcome(subject, &section.name, question, correct_answer, result));
        }

        let stats = aggregate(
            section
                .questions
                .iter()
                .zip(&outcomes)
                .filter_map(|(q, o)| o.result.as_ref().map(|r| (q, r))),
        );

        Ok(ScoredSection {
            outcomes,
            stats: SectionStats {
                name: section.name.clone(),
                optional_questions: section.optional_questions,
                stats,
            },
            issues,
        })
    }
}

fn outcome(
    subject: &str,
    section: &str,
    question: &Question,
    correct_answer: Option<String>,
    result: Option<QuestionResult>,
) -> QuestionOutcome {
    QuestionOutcome {
        subject: subject.to_string(),
        section: section.to_string(),
        question_id: question.id,
        question_type: question.question_type(),
        status: question.status,
        time_spent_secs: question.time_spent_secs,
        correct_answer,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::journey::JourneyWarning;
    use crate::model::{QuestionStatus, RecordedAnswer};
    use crate::results::ResultStatus;

    fn session() -> TestSession {
        serde_json::from_str(
            r#"{
                "name": "Mock Test 1",
                "duration_secs": 600,
                "subjects": [
                    {"name": "Physics", "sections": [
                        {"name": "Section A", "questions": [
                            {"id": 1, "type": "MCQ", "options": 4, "status": "answered", "answer": 2, "time_spent_secs": 40},
                            {"id": 2, "type": "MSQ", "options": 4, "status": "answered", "answer": [1, 3],
                             "marks": {"correct": 4, "incorrect": -2, "partial": 1}, "time_spent_secs": 60},
                            {"id": 3, "type": "NAT", "status": "notVisited"}
                        ]},
                        {"name": "Section B", "optional_questions": 1, "questions": [
                            {"id": 4, "type": "NAT", "status": "answered", "answer": "7.5", "time_spent_secs": 30},
                            {"id": 5, "type": "NAT", "status": "answered", "answer": 3, "time_spent_secs": 20}
                        ]}
                    ]},
                    {"name": "Maths", "sections": [
                        {"name": "Section A", "questions": [
                            {"id": 6, "type": "MSM", "rows": 2, "columns": 3, "status": "answered",
                             "answer": [[1], [2, 3]], "marks": {"correct": 2, "incorrect": -1}, "time_spent_secs": 90}
                        ]}
                    ]}
                ],
                "events": [
                    {"event": "testStarted", "countdown_secs": 600},
                    {"event": "currentQuestion", "question_id": 1, "countdown_secs": 600},
                    {"event": "answerSaved", "question_id": 1, "countdown_secs": 560},
                    {"event": "currentQuestion", "question_id": 2, "countdown_secs": 560},
                    {"event": "currentQuestion", "question_id": 4, "countdown_secs": 500},
                    {"event": "currentQuestion", "question_id": 5, "countdown_secs": 470},
                    {"event": "currentQuestion", "question_id": 6, "countdown_secs": 450},
                    {"event": "testFinished", "countdown_secs": 360}
                ]
            }"#,
        )
        .unwrap()
    }

    fn key() -> AnswerKey {
        AnswerKey::new("Mock Test 1")
            .with_answer("Physics", "Section A", 1, "B")
            .with_answer("Physics", "Section A", 2, "AC")
            .with_answer("Physics", "Section A", 3, "10")
            .with_answer("Physics", "Section B", 4, "7 TO 8")
            .with_answer("Physics", "Section B", 5, "3")
            .with_answer("Maths", "Section A", 6, "A-P, B-QR")
    }

    fn status_of(report: &TestReport, id: u32) -> Option<ResultStatus> {
        report
            .questions
            .iter()
            .find(|q| q.question_id == id)
            .and_then(|q| q.result_status())
    }

    #[test]
    fn scores_complete_session() {
        let report = ResultEngine::default().score(&session(), &key()).unwrap();

        assert_eq!(report.test.question_count, 6);
        assert_eq!(status_of(&report, 1), Some(ResultStatus::Correct));
        assert_eq!(status_of(&report, 2), Some(ResultStatus::Correct));
        assert_eq!(status_of(&report, 3), Some(ResultStatus::NotAnswered));
        // both attempted, the lower id is excluded
        assert_eq!(status_of(&report, 4), Some(ResultStatus::NotConsidered));
        assert_eq!(status_of(&report, 5), Some(ResultStatus::Correct));
        assert_eq!(status_of(&report, 6), Some(ResultStatus::Correct));

        let physics = report.stats.subject("Physics").unwrap();
        assert_eq!(physics.stats.marks.total, 12.0);
        assert_eq!(report.stats.overall.marks.total, 16.0);
        assert_eq!(report.stats.overall.accuracy.percentage, 100.0);
        assert!(report.key_issues.is_empty());
    }

    #[test]
    fn optional_rule_applies_before_key_lookup() {
        let mut session = session();
        session.subjects[0].sections[1].questions[1].status = QuestionStatus::NotAnswered;
        session.subjects[0].sections[1].questions[1].answer = None;
        let key = AnswerKey::new("Mock Test 1")
            .with_answer("Physics", "Section A", 1, "B")
            .with_answer("Physics", "Section A", 2, "AC")
            .with_answer("Physics", "Section A", 3, "10")
            .with_answer("Physics", "Section B", 4, "7 TO 8")
            .with_answer("Maths", "Section A", 6, "A-P, B-QR");

        let report = ResultEngine::default().score(&session, &key).unwrap();
        assert_eq!(status_of(&report, 4), Some(ResultStatus::Correct));
        assert_eq!(status_of(&report, 5), Some(ResultStatus::NotConsidered));
        assert!(report.key_issues.is_empty());
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = ResultEngine::default()
            .score(&session(), &AnswerKey::default())
            .unwrap_err();
        assert!(matches!(err, ScoreError::EmptyAnswerKey));
        assert!(err.is_recoverable());
    }

    #[test]
    fn key_gaps_leave_questions_unscored() {
        let key = AnswerKey::new("partial")
            .with_answer("Physics", "Section A", 1, "B")
            .with_answer("Physics", "Section A", 2, "Z");
        let report = ResultEngine::default().score(&session(), &key).unwrap();

        assert_eq!(status_of(&report, 1), Some(ResultStatus::Correct));
        assert_eq!(status_of(&report, 2), None);
        assert!(report
            .key_issues
            .iter()
            .any(|i| matches!(i, KeyIssue::Invalid { question_id: 2, .. })));
        assert!(report
            .key_issues
            .iter()
            .any(|i| matches!(i, KeyIssue::Missing { question_id: 6, .. })));
        assert_eq!(report.stats.overall.marks.total, 4.0);
        assert!(report.journey.lane(JourneyLane::Unscored).is_some());
    }

    #[test]
    fn incomplete_key_aborts_when_required() {
        let engine = ResultEngine::new(EvaluationConfig {
            require_complete_key: true,
            ..EvaluationConfig::default()
        });
        let key = AnswerKey::new("partial").with_answer("Physics", "Section A", 1, "B");
        match engine.score(&session(), &key) {
            Err(ScoreError::IncompleteAnswerKey { issues }) => assert_eq!(issues.len(), 4),
            other => panic!("expected IncompleteAnswerKey, got {other:?}"),
        }
    }

    #[test]
    fn shape_mismatch_fails_fast() {
        let mut session = session();
        session.subjects[0].sections[0].questions[0].answer =
            Some(RecordedAnswer::Matrix(vec![BTreeSet::from([1])]));
        let err = ResultEngine::default().score(&session, &key()).unwrap_err();
        assert!(matches!(
            err,
            ScoreError::RecordedAnswerMismatch { question_id: 1, .. }
        ));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn unreadable_nat_text_stays_with_its_question() {
        let mut session = session();
        let q3 = &mut session.subjects[0].sections[0].questions[2];
        q3.status = QuestionStatus::Answered;
        q3.answer = Some(RecordedAnswer::Text("abc".into()));
        session.subjects[0].sections[1].questions[1].answer = Some(RecordedAnswer::Text("  ".into()));

        let report = ResultEngine::default().score(&session, &key()).unwrap();
        assert_eq!(status_of(&report, 1), Some(ResultStatus::Correct));
        assert_eq!(status_of(&report, 3), Some(ResultStatus::Incorrect));
        assert_eq!(status_of(&report, 5), Some(ResultStatus::NotAnswered));
    }

    #[test]
    fn repeated_ids_exclude_exactly_the_optional_count() {
        let mut session = session();
        session.subjects[0].sections[1].questions[1].id = 4;

        let report = ResultEngine::default().score(&session, &key()).unwrap();
        let excluded = report
            .questions
            .iter()
            .filter(|q| q.result_status() == Some(ResultStatus::NotConsidered))
            .count();
        assert_eq!(excluded, 1);
    }

    #[test]
    fn journey_covers_every_question() {
        let report = ResultEngine::default().score(&session(), &key()).unwrap();
        let journey = &report.journey;
        assert_eq!(journey.finish_minutes, 4.0);
        assert!(journey.warnings.is_empty());

        let not_visited = journey.lane(JourneyLane::NotVisited).unwrap();
        assert!(not_visited.points.iter().flatten().all(|p| p.question_id == 3));

        let ids: BTreeSet<u32> = journey
            .series
            .iter()
            .flat_map(|s| s.points.iter().flatten().map(|p| p.question_id))
            .collect();
        assert_eq!(ids, (1..=6).collect());
    }

    #[test]
    fn missing_start_uses_session_duration() {
        let mut session = session();
        session.events.remove(0);
        let report = ResultEngine::default().score(&session, &key()).unwrap();
        assert_eq!(report.journey.start_countdown_secs, 600.0);
        assert!(matches!(
            report.journey.warnings[0],
            JourneyWarning::MissingStart { .. }
        ));
    }
}
