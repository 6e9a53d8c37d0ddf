//! Section, subject and test-level statistics.
//!
//! [`Stats`] is a commutative monoid: [`Stats::merge`] sums every counter,
//! time and mark component-wise and recomputes the derived averages, so
//! aggregating a union of questions equals merging the aggregates of its
//! parts. Subject and test totals are built that way from their sections.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{Question, QuestionStatus};
use crate::results::{QuestionResult, ResultStatus};

/// Question count with total and average time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub count: u32,
    pub total_time: f64,
    /// `total_time / max(count, 1)`.
    pub avg_time: f64,
}

impl TimeBucket {
    fn add(&mut self, time: f64) {
        self.count += 1;
        self.total_time += time;
        self.refresh();
    }

    fn merge(&mut self, other: &TimeBucket) {
        self.count += other.count;
        self.total_time += other.total_time;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.avg_time = self.total_time / f64::from(self.count.max(1));
    }
}

/// Marks earned in one category with the time spent earning them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarksBucket {
    pub count: u32,
    pub marks: f64,
    pub total_time: f64,
    /// Seconds per mark: `|total_time| / max(|marks|, 1)`.
    pub avg_time: f64,
}

impl MarksBucket {
    fn add(&mut self, marks: f64, time: f64) {
        self.count += 1;
        self.marks += marks;
        self.total_time += time;
        self.refresh();
    }

    fn merge(&mut self, other: &MarksBucket) {
        self.count += other.count;
        self.marks += other.marks;
        self.total_time += other.total_time;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.avg_time = self.total_time.abs() / self.marks.abs().max(1.0);
    }
}

/// One bucket per palette status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub answered: TimeBucket,
    pub not_answered: TimeBucket,
    pub marked: TimeBucket,
    pub marked_answered: TimeBucket,
    pub not_visited: TimeBucket,
}

impl StatusBreakdown {
    pub fn get(&self, status: QuestionStatus) -> &TimeBucket {
        match status {
            QuestionStatus::Answered => &self.answered,
            QuestionStatus::NotAnswered => &self.not_answered,
            QuestionStatus::Marked => &self.marked,
            QuestionStatus::MarkedAnswered => &self.marked_answered,
            QuestionStatus::NotVisited => &self.not_visited,
        }
    }

    fn get_mut(&mut self, status: QuestionStatus) -> &mut TimeBucket {
        match status {
            QuestionStatus::Answered => &mut self.answered,
            QuestionStatus::NotAnswered => &mut self.not_answered,
            QuestionStatus::Marked => &mut self.marked,
            QuestionStatus::MarkedAnswered => &mut self.marked_answered,
            QuestionStatus::NotVisited => &mut self.not_visited,
        }
    }

    fn merge(&mut self, other: &StatusBreakdown) {
        for status in QuestionStatus::ALL {
            self.get_mut(status).merge(other.get(status));
        }
    }
}

/// One bucket per scored result status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBreakdown {
    pub correct: TimeBucket,
    pub incorrect: TimeBucket,
    pub partial: TimeBucket,
    pub bonus: TimeBucket,
    pub dropped: TimeBucket,
    pub not_answered: TimeBucket,
}

impl ResultBreakdown {
    const SCORED: [ResultStatus; 6] = [
        ResultStatus::Correct,
        ResultStatus::Incorrect,
        ResultStatus::Partial,
        ResultStatus::Bonus,
        ResultStatus::Dropped,
        ResultStatus::NotAnswered,
    ];

    /// Bucket for `status`; `None` for `NotConsidered`, which is never counted.
    pub fn get(&self, status: ResultStatus) -> Option<&TimeBucket> {
        match status {
            ResultStatus::Correct => Some(&self.correct),
            ResultStatus::Incorrect => Some(&self.incorrect),
            ResultStatus::Partial => Some(&self.partial),
            ResultStatus::Bonus => Some(&self.bonus),
            ResultStatus::Dropped => Some(&self.dropped),
            ResultStatus::NotAnswered => Some(&self.not_answered),
            ResultStatus::NotConsidered => None,
        }
    }

    fn get_mut(&mut self, status: ResultStatus) -> Option<&mut TimeBucket> {
        match status {
            ResultStatus::Correct => Some(&mut self.correct),
            ResultStatus::Incorrect => Some(&mut self.incorrect),
            ResultStatus::Partial => Some(&mut self.partial),
            ResultStatus::Bonus => Some(&mut self.bonus),
            ResultStatus::Dropped => Some(&mut self.dropped),
            ResultStatus::NotAnswered => Some(&mut self.not_answered),
            ResultStatus::NotConsidered => None,
        }
    }

    fn merge(&mut self, other: &ResultBreakdown) {
        for status in Self::SCORED {
            if let (Some(mine), Some(theirs)) = (self.get_mut(status), other.get(status)) {
                mine.merge(theirs);
            }
        }
    }
}

/// Marks split by how they were earned or lost.
///
/// `positive` only takes correct and partial results, so an incorrect matrix
/// question that nets positive marks counts toward `total` but no bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarksBreakdown {
    pub positive: MarksBucket,
    pub negative: MarksBucket,
    pub bonus: MarksBucket,
    pub dropped: MarksBucket,
    pub total: f64,
}

impl MarksBreakdown {
    fn record(&mut self, result: &QuestionResult, time: f64) {
        let marks = result.marks_awarded;
        match result.status {
            ResultStatus::Bonus => self.bonus.add(marks, time),
            ResultStatus::Dropped => self.dropped.add(marks, time),
            ResultStatus::Correct | ResultStatus::Partial if marks > 0.0 => {
                self.positive.add(marks, time)
            }
            _ if marks < 0.0 => self.negative.add(marks, time),
            _ => {}
        }
        self.total += marks;
    }

    fn merge(&mut self, other: &MarksBreakdown) {
        self.positive.merge(&other.positive);
        self.negative.merge(&other.negative);
        self.bonus.merge(&other.bonus);
        self.dropped.merge(&other.dropped);
        self.total += other.total;
    }
}

/// Fractional-credit accuracy bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    pub numerator: f64,
    /// Questions that ended correct, incorrect or partial.
    pub denominator: u32,
    /// `numerator / max(denominator, 1)` as a percentage with two decimals.
    pub percentage: f64,
}

impl Accuracy {
    fn record(&mut self, result: &QuestionResult) {
        if result.status.counts_toward_accuracy() {
            self.numerator += result.accuracy_numerator;
            self.denominator += 1;
        }
        self.refresh();
    }

    fn merge(&mut self, other: &Accuracy) {
        self.numerator += other.numerator;
        self.denominator += other.denominator;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.percentage = accuracy_percentage(self.numerator, self.denominator);
    }
}

/// `round(numerator / max(denominator, 1) * 10000) / 100`.
pub fn accuracy_percentage(numerator: f64, denominator: u32) -> f64 {
    (numerator / f64::from(denominator.max(1)) * 10_000.0).round() / 100.0
}

/// Aggregated statistics over a set of scored questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Every considered question.
    pub questions: TimeBucket,
    pub by_status: StatusBreakdown,
    pub by_result: ResultBreakdown,
    pub marks: MarksBreakdown,
    pub accuracy: Accuracy,
}

impl Stats {
    /// Fold one scored question in. `NotConsidered` results are ignored.
    pub fn record(&mut self, question: &Question, result: &QuestionResult) {
        let Some(bucket) = self.by_result.get_mut(result.status) else {
            return;
        };
        let time = question.time_spent_secs;
        bucket.add(time);
        self.questions.add(time);
        self.by_status.get_mut(question.status).add(time);
        self.marks.record(result, time);
        self.accuracy.record(result);
    }

    /// Component-wise sum with `other`.
    pub fn merge(&mut self, other: &Stats) {
        self.questions.merge(&other.questions);
        self.by_status.merge(&other.by_status);
        self.by_result.merge(&other.by_result);
        self.marks.merge(&other.marks);
        self.accuracy.merge(&other.accuracy);
    }
}

/// Aggregate scored questions into [`Stats`].
pub fn aggregate<'a, I>(scored: I) -> Stats
where
    I: IntoIterator<Item = (&'a Question, &'a QuestionResult)>,
{
    let mut stats = Stats::default();
    for (question, result) in scored {
        stats.record(question, result);
    }
    stats
}

/// Combine several [`Stats`] into one.
pub fn aggregate_of<'a, I>(parts: I) -> Stats
where
    I: IntoIterator<Item = &'a Stats>,
{
    let mut stats = Stats::default();
    for part in parts {
        stats.merge(part);
    }
    stats
}

/// Positions of the questions the optional-questions rule excludes from
/// scoring.
///
/// Attempted questions rank before unattempted ones and higher ids before
/// lower ones; the last `optional` questions in that order are excluded, so
/// unattempted questions go first and then the lowest-id attempts. The
/// result indexes into `questions`, so repeated ids are excluded one at a time.
pub fn select_not_considered(questions: &[Question], optional: u32) -> BTreeSet<usize> {
    if optional == 0 {
        return BTreeSet::new();
    }

    let mut ranked: Vec<usize> = (0..questions.len()).collect();
    ranked.sort_by_key(|&i| {
        let q = &questions[i];
        (!q.status.is_attempted(), std::cmp::Reverse(q.id))
    });

    let keep = ranked.len().saturating_sub(optional as usize);
    ranked[keep..].iter().copied().collect()
}

/// Statistics of one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionStats {
    pub name: String,
    pub optional_questions: u32,
    pub stats: Stats,
}

/// Statistics of one subject and its sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectStats {
    pub name: String,
    pub stats: Stats,
    pub sections: Vec<SectionStats>,
}

impl SubjectStats {
    /// Build subject totals by merging its sections.
    pub fn from_sections(name: impl Into<String>, sections: Vec<SectionStats>) -> Self {
        let stats = aggregate_of(sections.iter().map(|s| &s.stats));
        Self {
            name: name.into(),
            stats,
            sections,
        }
    }
}

/// Statistics tree of a whole test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestStats {
    pub overall: Stats,
    pub subjects: Vec<SubjectStats>,
}

impl TestStats {
    /// Build test totals by merging its subjects.
    pub fn from_subjects(subjects: Vec<SubjectStats>) -> Self {
        let overall = aggregate_of(subjects.iter().map(|s| &s.stats));
        Self { overall, subjects }
    }

    pub fn subject(&self, name: &str) -> Option<&SubjectStats> {
        self.subjects.iter().find(|s| s.name == name)
    }
}
