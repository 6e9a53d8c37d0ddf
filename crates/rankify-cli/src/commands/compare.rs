//! The `rankify compare` command.

use std::path::PathBuf;

use anyhow::Result;

use rankify_core::report::TestReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = TestReport::load_json(&baseline_path)?;
    let current = TestReport::load_json(&current_path)?;

    let comparison = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", comparison.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        }
        _ => {
            // text format
            let overall = &comparison.overall;
            println!(
                "Comparison: {:.2} -> {:.2} marks ({:+.2}), {} regression(s), {} improvement(s), {} changed question(s)",
                overall.baseline_marks,
                overall.current_marks,
                overall.marks_delta,
                comparison.regressions().len(),
                comparison.improvements().len(),
                comparison.question_changes.len()
            );

            let regressions = comparison.regressions();
            if !regressions.is_empty() {
                println!("\nRegressions:");
                for r in regressions {
                    println!(
                        "  {} {:.2} -> {:.2} ({:+.2}), accuracy {:+.2}%",
                        r.name, r.baseline_marks, r.current_marks, r.marks_delta, r.accuracy_delta
                    );
                }
            }

            let improvements = comparison.improvements();
            if !improvements.is_empty() {
                println!("\nImprovements:");
                for i in improvements {
                    println!(
                        "  {} {:.2} -> {:.2} ({:+.2}), accuracy {:+.2}%",
                        i.name, i.baseline_marks, i.current_marks, i.marks_delta, i.accuracy_delta
                    );
                }
            }

            if !comparison.new_subjects.is_empty() {
                println!("\n{} new subject(s)", comparison.new_subjects.len());
            }
            if !comparison.removed_subjects.is_empty() {
                println!("{} removed subject(s)", comparison.removed_subjects.len());
            }
        }
    }

    if fail_on_regression && comparison.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
