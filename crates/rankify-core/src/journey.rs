//! Test journey reconstruction.
//!
//! Replays the countdown-stamped event log into a step-function trace of
//! which question was on screen when, split into series by result so that
//! consecutive questions with the same outcome form one segment.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{TestEvent, TestEventKind};
use crate::results::ResultStatus;

/// The series a question is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JourneyLane {
    Correct,
    Incorrect,
    Partial,
    Bonus,
    Dropped,
    NotAnswered,
    NotConsidered,
    /// The question has no result, e.g. its answer-key entry is missing.
    Unscored,
    /// The question was never opened.
    NotVisited,
}

impl From<ResultStatus> for JourneyLane {
    fn from(status: ResultStatus) -> Self {
        match status {
            ResultStatus::Correct => JourneyLane::Correct,
            ResultStatus::Incorrect => JourneyLane::Incorrect,
            ResultStatus::Partial => JourneyLane::Partial,
            ResultStatus::Bonus => JourneyLane::Bonus,
            ResultStatus::Dropped => JourneyLane::Dropped,
            ResultStatus::NotAnswered => JourneyLane::NotAnswered,
            ResultStatus::NotConsidered => JourneyLane::NotConsidered,
        }
    }
}

impl fmt::Display for JourneyLane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JourneyLane::Correct => "correct",
            JourneyLane::Incorrect => "incorrect",
            JourneyLane::Partial => "partial",
            JourneyLane::Bonus => "bonus",
            JourneyLane::Dropped => "dropped",
            JourneyLane::NotAnswered => "not answered",
            JourneyLane::NotConsidered => "not considered",
            JourneyLane::Unscored => "unscored",
            JourneyLane::NotVisited => "not visited",
        };
        f.write_str(label)
    }
}

/// A breakpoint of the step plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JourneyPoint {
    /// Minutes since the test started, two decimals.
    pub minutes: f64,
    pub question_id: u32,
}

/// Points of one lane; `None` is a gap between segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneySeries {
    pub lane: JourneyLane,
    pub points: Vec<Option<JourneyPoint>>,
}

/// How often a question was opened, saved and cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionActivity {
    pub visits: u32,
    pub saves: u32,
    pub clears: u32,
}

/// Data-integrity problems found while replaying the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JourneyWarning {
    /// No `testStarted` event; the fallback countdown start was used.
    MissingStart { fallback_secs: f64 },
    /// No `testFinished` event; the trace is closed at minute zero.
    MissingFinish,
    /// The log opens a question that is not part of the result set.
    UnknownQuestion { question_id: u32 },
}

impl fmt::Display for JourneyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JourneyWarning::MissingStart { fallback_secs } => write!(
                f,
                "no test-start event; elapsed times measured from {fallback_secs}s"
            ),
            JourneyWarning::MissingFinish => {
                write!(f, "no test-finish event; journey closed at minute 0")
            }
            JourneyWarning::UnknownQuestion { question_id } => {
                write!(f, "event log opens unknown question {question_id}")
            }
        }
    }
}

/// The reconstructed journey.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalTrace {
    pub series: Vec<JourneySeries>,
    /// Countdown value the elapsed times are measured from.
    pub start_countdown_secs: f64,
    pub finish_minutes: f64,
    pub activity: BTreeMap<u32, QuestionActivity>,
    pub warnings: Vec<JourneyWarning>,
}

impl TemporalTrace {
    pub fn lane(&self, lane: JourneyLane) -> Option<&JourneySeries> {
        self.series.iter().find(|s| s.lane == lane)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn elapsed_minutes(start_secs: f64, countdown_secs: f64) -> f64 {
    round2((start_secs - countdown_secs).abs() / 60.0)
}

/// Replay `events` against the countdown timer.
///
/// `lanes` maps every question id of the test to the lane it is drawn on.
/// `fallback_start_secs` stands in for the countdown start when the log has
/// no `testStarted` event.
pub fn reconstruct(
    events: &[TestEvent],
    lanes: &BTreeMap<u32, JourneyLane>,
    fallback_start_secs: f64,
) -> TemporalTrace {
    let mut warnings = Vec::new();

    let start = events
        .iter()
        .find(|e| matches!(e.kind, TestEventKind::TestStarted))
        .map(|e| e.countdown_secs)
        .unwrap_or_else(|| {
            warnings.push(JourneyWarning::MissingStart {
                fallback_secs: fallback_start_secs,
            });
            fallback_start_secs
        });

    let finish_minutes = events
        .iter()
        .rev()
        .find(|e| matches!(e.kind, TestEventKind::TestFinished))
        .map(|e| elapsed_minutes(start, e.countdown_secs))
        .unwrap_or_else(|| {
            warnings.push(JourneyWarning::MissingFinish);
            0.0
        });

    let mut series: BTreeMap<JourneyLane, Vec<Option<JourneyPoint>>> = BTreeMap::new();
    let mut activity: BTreeMap<u32, QuestionActivity> = BTreeMap::new();
    let mut unknown = BTreeSet::new();
    let mut open: Option<(JourneyLane, u32)> = None;

    for event in events {
        match event.kind {
            TestEventKind::CurrentQuestion { question_id } => {
                let minutes = elapsed_minutes(start, event.countdown_secs);
                let lane = match lanes.get(&question_id) {
                    Some(lane) => *lane,
                    None => {
                        if unknown.insert(question_id) {
                            warnings.push(JourneyWarning::UnknownQuestion { question_id });
                        }
                        JourneyLane::Unscored
                    }
                };
                activity.entry(question_id).or_default().visits += 1;

                if let Some((open_lane, open_id)) = open {
                    if open_lane != lane {
                        let outgoing = series.entry(open_lane).or_default();
                        outgoing.push(Some(JourneyPoint {
                            minutes,
                            question_id: open_id,
                        }));
                        outgoing.push(None);
                    }
                }
                series.entry(lane).or_default().push(Some(JourneyPoint {
                    minutes,
                    question_id,
                }));
                open = Some((lane, question_id));
            }
            TestEventKind::AnswerSaved { question_id } => {
                activity.entry(question_id).or_default().saves += 1;
            }
            TestEventKind::AnswerCleared { question_id } => {
                activity.entry(question_id).or_default().clears += 1;
            }
            TestEventKind::TestStarted | TestEventKind::TestFinished => {}
        }
    }

    if let Some((lane, question_id)) = open {
        series.entry(lane).or_default().push(Some(JourneyPoint {
            minutes: finish_minutes,
            question_id,
        }));
    }

    for &question_id in lanes.keys() {
        if activity.get(&question_id).map_or(0, |a| a.visits) == 0 {
            let point = Some(JourneyPoint {
                minutes: 0.0,
                question_id,
            });
            series
                .entry(JourneyLane::NotVisited)
                .or_default()
                .extend([point, point, None]);
        }
    }

    for warning in &warnings {
        tracing::warn!("journey: {warning:?}");
    }

    TemporalTrace {
        series: series
            .into_iter()
            .map(|(lane, points)| JourneySeries { lane, points })
            .collect(),
        start_countdown_secs: start,
        finish_minutes,
        activity,
        warnings,
    }
}
