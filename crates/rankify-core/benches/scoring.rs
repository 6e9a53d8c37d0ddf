use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rankify_core::answer_key::AnswerKey;
use rankify_core::engine::ResultEngine;
use rankify_core::model::{
    AnswerFormat, Marks, Question, QuestionStatus, RecordedAnswer, Section, Subject, TestEvent,
    TestEventKind, TestSession,
};
use rankify_core::statistics::{aggregate_of, Stats};

const SUBJECTS: [&str; 3] = ["Physics", "Chemistry", "Maths"];
const PER_SECTION: u32 = 50;

/// Three subjects of two sections each, mixing every question type.
fn make_session() -> (TestSession, AnswerKey) {
    let mut key = AnswerKey::new("bench");
    let mut subjects = Vec::new();
    let mut events = vec![TestEvent::new(TestEventKind::TestStarted, 10_800.0)];
    let mut id = 0;

    for subject in SUBJECTS {
        let mut sections = Vec::new();
        for (section, optional) in [("Section A", 0), ("Section B", 5)] {
            let mut questions = Vec::new();
            for n in 0..PER_SECTION {
                id += 1;
                let (format, answer, text) = match n % 4 {
                    0 => (
                        AnswerFormat::Mcq { options: 4 },
                        RecordedAnswer::Single(n % 4 + 1),
                        "A",
                    ),
                    1 => (
                        AnswerFormat::Msq { options: 4 },
                        RecordedAnswer::Selection([1, 3].into()),
                        "ACD",
                    ),
                    2 => (AnswerFormat::Nat, RecordedAnswer::Numeric(7.25), "7 TO 7.5"),
                    _ => (
                        AnswerFormat::Msm {
                            rows: 2,
                            columns: 3,
                        },
                        RecordedAnswer::Matrix(vec![[1].into(), [2, 3].into()]),
                        "A-P, B-QR",
                    ),
                };
                let status = if n % 7 == 0 {
                    QuestionStatus::NotVisited
                } else {
                    QuestionStatus::Answered
                };
                questions.push(Question {
                    id,
                    format,
                    answer: Some(answer),
                    time_spent_secs: f64::from(n % 90),
                    status,
                    marks: Marks {
                        partial: Some(1.0),
                        ..Marks::default()
                    },
                });
                key.insert(subject, section, id, text);
                events.push(TestEvent::new(
                    TestEventKind::CurrentQuestion { question_id: id },
                    10_800.0 - f64::from(id) * 20.0,
                ));
            }
            sections.push(Section {
                name: section.to_string(),
                optional_questions: optional,
                questions,
            });
        }
        subjects.push(Subject {
            name: subject.to_string(),
            sections,
        });
    }
    events.push(TestEvent::new(TestEventKind::TestFinished, 0.0));

    let session = TestSession {
        name: "bench".into(),
        duration_secs: 10_800,
        subjects,
        events,
    };
    (session, key)
}

fn bench_score_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_session");
    let (session, key) = make_session();
    let engine = ResultEngine::default();

    group.bench_function("300_questions", |b| {
        b.iter(|| engine.score(black_box(&session), black_box(&key)))
    });

    group.finish();
}

fn bench_merge_stats(c: &mut Criterion) {
    let (session, key) = make_session();
    let report = ResultEngine::default()
        .score(&session, &key)
        .expect("bench session scores");
    let parts: Vec<Stats> = report
        .stats
        .subjects
        .iter()
        .flat_map(|s| s.sections.iter().map(|sec| sec.stats))
        .collect();

    c.bench_function("aggregate_of_sections", |b| {
        b.iter(|| aggregate_of(black_box(&parts)))
    });
}

criterion_group!(benches, bench_score_session, bench_merge_stats);
criterion_main!(benches);
