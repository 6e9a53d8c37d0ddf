//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use rankify_core::report::{QuestionOutcome, TestReport};
use rankify_core::results::ResultStatus;
use rankify_core::statistics::{Stats, SubjectStats};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report from a scored test.
pub fn generate_html(report: &TestReport) -> String {
    let mut html = String::new();
    let overall = &report.stats.overall;

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>Rankify report: {}</title>\n",
        html_escape(&report.test.name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>Rankify report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Test: <strong>{}</strong> | {} questions | {} min | {}</p>\n",
        html_escape(&report.test.name),
        report.test.question_count,
        report.test.duration_secs / 60,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str(&format!(
        "<p class=\"score\">{:.2} marks | {:.2}% accuracy | {:.0}s on questions</p>\n",
        overall.marks.total, overall.accuracy.percentage, overall.questions.total_time
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Scope</th><th>Questions</th><th>Correct</th><th>Incorrect</th><th>Partial</th><th>Not answered</th><th>Positive</th><th>Negative</th><th>Marks</th><th>Accuracy</th><th>Avg time</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for subject in &report.stats.subjects {
        html.push_str(&summary_row(&subject.name, "subject", &subject.stats));
        for section in &subject.sections {
            let label = if section.optional_questions > 0 {
                format!("{} (best of, {} optional)", section.name, section.optional_questions)
            } else {
                section.name.clone()
            };
            html.push_str(&summary_row(&label, "section", &section.stats));
        }
    }
    html.push_str(&summary_row("Overall", "overall", overall));
    html.push_str("</tbody></table>\n");

    if !report.stats.subjects.is_empty() {
        html.push_str(&generate_bar_chart(&report.stats.subjects));
    }

    html.push_str("</section>\n");

    // Per-question results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Questions</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Subject</th><th onclick=\"sortTable(1)\">Section</th><th onclick=\"sortTable(2)\">Question</th><th onclick=\"sortTable(3)\">Type</th><th onclick=\"sortTable(4)\">Status</th><th onclick=\"sortTable(5)\">Result</th><th onclick=\"sortTable(6)\">Key</th><th onclick=\"sortTable(7)\">Marks</th><th onclick=\"sortTable(8)\">Time (s)</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for q in &report.questions {
        html.push_str(&question_row(q));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Journey
    html.push_str("<section class=\"journey\">\n");
    html.push_str("<h2>Journey</h2>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Finished after {:.2} min</p>\n",
        report.journey.finish_minutes
    ));
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Lane</th><th>Segments</th><th>Questions</th></tr></thead>\n<tbody>\n");
    for series in &report.journey.series {
        let segments = series.points.iter().filter(|p| p.is_none()).count()
            + usize::from(series.points.last().is_some_and(|p| p.is_some()));
        let mut ids: Vec<u32> = series.points.iter().flatten().map(|p| p.question_id).collect();
        ids.sort_unstable();
        ids.dedup();
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            series.lane,
            segments,
            ids.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Data problems
    if !report.key_issues.is_empty() || !report.journey.warnings.is_empty() {
        html.push_str("<section class=\"issues\">\n");
        html.push_str("<h2>Issues</h2>\n<ul>\n");
        for issue in &report.key_issues {
            html.push_str(&format!("<li class=\"fail\">{}</li>\n", html_escape(&issue.to_string())));
        }
        for warning in &report.journey.warnings {
            html.push_str(&format!("<li>{}</li>\n", html_escape(&warning.to_string())));
        }
        html.push_str("</ul>\n</section>\n");
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str(&format!(
        "<footer class=\"meta\">Report {} generated {}</footer>\n",
        report.id,
        chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
    ));

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &TestReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn summary_row(label: &str, class: &str, stats: &Stats) -> String {
    let r = &stats.by_result;
    format!(
        "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}%</td><td>{:.1}s</td></tr>\n",
        class,
        html_escape(label),
        stats.questions.count,
        r.correct.count,
        r.incorrect.count,
        r.partial.count,
        r.not_answered.count,
        stats.marks.positive.marks,
        stats.marks.negative.marks,
        stats.marks.total,
        stats.accuracy.percentage,
        stats.questions.avg_time,
    )
}

fn result_class(status: Option<ResultStatus>) -> &'static str {
    match status {
        Some(ResultStatus::Correct | ResultStatus::Bonus | ResultStatus::Dropped) => "pass",
        Some(ResultStatus::Partial) => "partial",
        Some(ResultStatus::Incorrect) => "fail",
        Some(ResultStatus::NotAnswered | ResultStatus::NotConsidered) => "muted",
        None => "unscored",
    }
}

fn question_row(q: &QuestionOutcome) -> String {
    let status = q.result_status();
    let result_text = status.map_or_else(|| "unscored".to_string(), |s| s.to_string());
    let marks = q
        .result
        .map_or_else(|| "-".to_string(), |r| format!("{:.2}", r.marks_awarded));
    format!(
        "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.0}</td></tr>\n",
        result_class(status),
        html_escape(&q.subject),
        html_escape(&q.section),
        q.question_id,
        q.question_type,
        q.status,
        result_text,
        html_escape(q.correct_answer.as_deref().unwrap_or("-")),
        marks,
        q.time_spent_secs,
    )
}

fn generate_bar_chart(subjects: &[SubjectStats]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let scale = subjects
        .iter()
        .map(|s| s.stats.marks.total.abs())
        .fold(0.0_f64, f64::max)
        .max(1.0);

    let total_height = subjects.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 80,
        total_height
    );

    for (i, subject) in subjects.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let marks = subject.stats.marks.total;
        let width = (marks.abs() / scale * max_width as f64) as usize;

        let accuracy = subject.stats.accuracy.percentage;
        let color = if marks < 0.0 {
            "#ef4444"
        } else if accuracy >= 80.0 {
            "#22c55e"
        } else if accuracy >= 50.0 {
            "#eab308"
        } else {
            "#f97316"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&subject.name)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.2}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            marks
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --partial: #fef9c3; --muted: #f3f4f6; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --partial: #713f12; --muted: #1f2937; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.score { font-size: 1.25rem; font-weight: bold; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
tr.subject td:first-child { font-weight: bold; }
tr.section td:first-child { padding-left: 2rem; }
tr.overall { font-weight: bold; border-top: 2px solid var(--fg); }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.partial { background: var(--partial); }
.muted { background: var(--muted); }
.unscored { font-style: italic; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    const cmp = !isNaN(na) && !isNaN(nb) ? na - nb : va.localeCompare(vb);
    return asc ? cmp : -cmp;
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
