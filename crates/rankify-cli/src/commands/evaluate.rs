//! The `rankify evaluate` command.

use std::path::PathBuf;

use anyhow::Result;

use rankify_core::answer_key::load_answer_key;
use rankify_core::engine::ResultEngine;
use rankify_core::model::TestSession;
use rankify_core::report::TestReport;
use rankify_core::statistics::Stats;
use rankify_report::html::write_html_report;

use crate::config::load_config_from;

pub fn execute(
    session_path: PathBuf,
    key_path: PathBuf,
    output: Option<PathBuf>,
    format: Option<String>,
    config_path: Option<PathBuf>,
    require_complete_key: bool,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if require_complete_key {
        config.evaluation.require_complete_key = true;
    }

    let session = TestSession::load_json(&session_path)?;
    let key = load_answer_key(&key_path)?;

    eprintln!(
        "rankify v{}: scoring '{}' ({} questions, {} key entries)",
        env!("CARGO_PKG_VERSION"),
        session.name,
        session.question_count(),
        key.len()
    );

    let engine = ResultEngine::new(config.evaluation.clone());
    let report = match engine.score(&session, &key) {
        Ok(report) => report,
        Err(e) if e.is_recoverable() => {
            anyhow::bail!(
                "{e}; check the key with `rankify validate-key --answer-key {} --session {}`",
                key_path.display(),
                session_path.display()
            );
        }
        Err(e) => return Err(e.into()),
    };

    print_summary(&report);

    let output = output.unwrap_or(config.output_dir);
    let format = format.unwrap_or(config.default_format);
    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("report-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("report-{timestamp}.html"));
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

fn stats_row(scope: &str, stats: &Stats) -> Vec<String> {
    vec![
        scope.to_string(),
        stats.questions.count.to_string(),
        stats.by_result.correct.count.to_string(),
        stats.by_result.incorrect.count.to_string(),
        stats.by_result.partial.count.to_string(),
        stats.by_result.not_answered.count.to_string(),
        format!("{:.2}", stats.marks.total),
        format!("{:.2}%", stats.accuracy.percentage),
        format!("{:.1}s", stats.questions.avg_time),
    ]
}

fn print_summary(report: &TestReport) {
    use comfy_table::Table;

    let mut table = Table::new();
    table.set_header(vec![
        "Scope",
        "Questions",
        "Correct",
        "Incorrect",
        "Partial",
        "Not answered",
        "Marks",
        "Accuracy",
        "Avg time",
    ]);

    for subject in &report.stats.subjects {
        table.add_row(stats_row(&subject.name, &subject.stats));
        if subject.sections.len() > 1 {
            for section in &subject.sections {
                table.add_row(stats_row(&format!("  {}", section.name), &section.stats));
            }
        }
    }
    table.add_row(stats_row("Overall", &report.stats.overall));

    println!("{table}");

    if !report.key_issues.is_empty() {
        eprintln!(
            "\n{} question(s) left unscored because of answer-key issues:",
            report.key_issues.len()
        );
        for issue in &report.key_issues {
            eprintln!("  {issue}");
        }
    }
    for warning in &report.journey.warnings {
        eprintln!("Journey warning: {warning}");
    }
}
