//! CLI integration tests using assert_cmd.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use rankify_core::answer_key::load_answer_key;
use rankify_core::engine::ResultEngine;
use rankify_core::model::{QuestionStatus, TestSession};

fn rankify() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("rankify").unwrap()
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures")
        .join(name)
}

#[test]
fn evaluate_prints_summary_and_writes_reports() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("results");

    rankify()
        .current_dir(dir.path())
        .arg("evaluate")
        .arg("--session")
        .arg(fixture("mock-session.json"))
        .arg("--answer-key")
        .arg(fixture("mock-key.toml"))
        .arg("--output")
        .arg(&out)
        .arg("--format")
        .arg("all")
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall"))
        .stdout(predicate::str::contains("22.00"))
        .stdout(predicate::str::contains("59.52%"))
        .stderr(predicate::str::contains("Results saved to"))
        .stderr(predicate::str::contains("HTML report"));

    let mut extensions: Vec<String> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| {
            e.unwrap()
                .path()
                .extension()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    extensions.sort();
    assert_eq!(extensions, vec!["html", "json"]);
}

#[test]
fn evaluate_uses_config_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("rankify.toml"),
        "output_dir = \"from-config\"\ndefault_format = \"html\"\n",
    )
    .unwrap();

    rankify()
        .current_dir(dir.path())
        .env_remove("RANKIFY_OUTPUT_DIR")
        .arg("evaluate")
        .arg("--session")
        .arg(fixture("mock-session.json"))
        .arg("--answer-key")
        .arg(fixture("mock-key.toml"))
        .assert()
        .success();

    let written: Vec<_> = std::fs::read_dir(dir.path().join("from-config"))
        .unwrap()
        .collect();
    assert_eq!(written.len(), 1);
}

#[test]
fn evaluate_env_overrides_output_dir() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("from-env");

    rankify()
        .current_dir(dir.path())
        .env("RANKIFY_OUTPUT_DIR", &out)
        .arg("evaluate")
        .arg("--session")
        .arg(fixture("mock-session.json"))
        .arg("--answer-key")
        .arg(fixture("mock-key.toml"))
        .assert()
        .success();

    assert!(out.is_dir());
}

#[test]
fn evaluate_with_incomplete_key_reports_issues() {
    let dir = TempDir::new().unwrap();

    rankify()
        .current_dir(dir.path())
        .arg("evaluate")
        .arg("--session")
        .arg(fixture("mock-session.json"))
        .arg("--answer-key")
        .arg(fixture("mock-key-incomplete.toml"))
        .arg("--output")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("2 question(s) left unscored"))
        .stderr(predicate::str::contains("Q9: no answer-key entry"));
}

#[test]
fn evaluate_requiring_complete_key_fails() {
    let dir = TempDir::new().unwrap();

    rankify()
        .current_dir(dir.path())
        .arg("evaluate")
        .arg("--session")
        .arg(fixture("mock-session.json"))
        .arg("--answer-key")
        .arg(fixture("mock-key-incomplete.toml"))
        .arg("--output")
        .arg(dir.path())
        .arg("--require-complete-key")
        .assert()
        .failure()
        .stderr(predicate::str::contains("answer key incomplete"))
        .stderr(predicate::str::contains("validate-key"));
}

#[test]
fn evaluate_missing_session_fails() {
    rankify()
        .arg("evaluate")
        .arg("--session")
        .arg("no_such_session.json")
        .arg("--answer-key")
        .arg(fixture("mock-key.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_key_against_session() {
    rankify()
        .arg("validate-key")
        .arg("--answer-key")
        .arg(fixture("mock-key.toml"))
        .arg("--session")
        .arg(fixture("mock-session.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("11 entries"))
        .stdout(predicate::str::contains("Answer key valid"));
}

#[test]
fn validate_incomplete_key() {
    rankify()
        .arg("validate-key")
        .arg("--answer-key")
        .arg(fixture("mock-key-incomplete.toml"))
        .arg("--session")
        .arg(fixture("mock-session.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("not a valid MCQ answer"))
        .stdout(predicate::str::contains("3 warning(s) found"));
}

#[test]
fn validate_nonexistent_key() {
    rankify()
        .arg("validate-key")
        .arg("--answer-key")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn parse_answer_nat_ranges() {
    rankify()
        .arg("parse-answer")
        .arg("--type")
        .arg("nat")
        .arg("5 to 10 or -5")
        .assert()
        .success()
        .stdout(predicate::str::contains("Canonical: 5 TO 10 OR -5"));
}

#[test]
fn parse_answer_msq_options() {
    rankify()
        .arg("parse-answer")
        .arg("--type")
        .arg("msq")
        .arg("ACD")
        .assert()
        .success()
        .stdout(predicate::str::contains("Options: 1, 3, 4"));
}

#[test]
fn parse_answer_matrix() {
    rankify()
        .arg("parse-answer")
        .arg("--type")
        .arg("msm")
        .arg("--rows")
        .arg("2")
        .arg("--columns")
        .arg("3")
        .arg("A-P, B-QR")
        .assert()
        .success()
        .stdout(predicate::str::contains("Row 2: columns 2, 3"));
}

#[test]
fn parse_answer_rejects_garbage() {
    rankify()
        .arg("parse-answer")
        .arg("--type")
        .arg("nat")
        .arg("five")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not parse"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    rankify()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created rankify.toml"))
        .stdout(predicate::str::contains("Created answer-keys/example.toml"));

    assert!(dir.path().join("rankify.toml").exists());
    assert!(dir.path().join("answer-keys/example.toml").exists());

    // the generated key must itself be loadable
    let key = load_answer_key(&dir.path().join("answer-keys/example.toml")).unwrap();
    assert_eq!(key.len(), 5);
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    rankify()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    rankify()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

fn write_reports(dir: &TempDir) -> (PathBuf, PathBuf) {
    let key = load_answer_key(&fixture("mock-key.toml")).unwrap();
    let baseline_session = TestSession::load_json(&fixture("mock-session.json")).unwrap();

    // the retake gets question 1 wrong
    let mut retake = baseline_session.clone();
    let q1 = &mut retake.subjects[0].sections[0].questions[0];
    q1.answer = Some(rankify_core::model::RecordedAnswer::Single(4));
    q1.status = QuestionStatus::Answered;

    let engine = ResultEngine::default();
    let baseline_path = dir.path().join("baseline.json");
    let current_path = dir.path().join("current.json");
    engine
        .score(&baseline_session, &key)
        .unwrap()
        .save_json(&baseline_path)
        .unwrap();
    engine
        .score(&retake, &key)
        .unwrap()
        .save_json(&current_path)
        .unwrap();
    (baseline_path, current_path)
}

#[test]
fn compare_reports() {
    let dir = TempDir::new().unwrap();
    let (baseline_path, current_path) = write_reports(&dir);

    rankify()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline_path)
        .arg("--current")
        .arg(&current_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("regression"))
        .stdout(predicate::str::contains("Physics"));
}

#[test]
fn compare_fails_on_regression_when_asked() {
    let dir = TempDir::new().unwrap();
    let (baseline_path, current_path) = write_reports(&dir);

    rankify()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline_path)
        .arg("--current")
        .arg(&current_path)
        .arg("--fail-on-regression")
        .assert()
        .code(1);

    // reversed, the retake is an improvement
    rankify()
        .arg("compare")
        .arg("--baseline")
        .arg(&current_path)
        .arg("--current")
        .arg(&baseline_path)
        .arg("--fail-on-regression")
        .assert()
        .success();
}

#[test]
fn compare_markdown_output() {
    let dir = TempDir::new().unwrap();
    let (baseline_path, current_path) = write_reports(&dir);

    rankify()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline_path)
        .arg("--current")
        .arg(&current_path)
        .arg("--format")
        .arg("markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("### Subjects"))
        .stdout(predicate::str::contains("| Physics | Section A | 1 | correct | incorrect |"));
}

#[test]
fn compare_nonexistent_report() {
    rankify()
        .arg("compare")
        .arg("--baseline")
        .arg("no_such_file.json")
        .arg("--current")
        .arg("also_no_file.json")
        .assert()
        .failure();
}

#[test]
fn help_output() {
    rankify()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("CBT mock-test scoring and analysis"));
}

#[test]
fn version_output() {
    rankify()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rankify"));
}
