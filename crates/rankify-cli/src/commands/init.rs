//! The `rankify init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("rankify.toml").exists() {
        println!("rankify.toml already exists, skipping.");
    } else {
        std::fs::write("rankify.toml", SAMPLE_CONFIG)?;
        println!("Created rankify.toml");
    }

    std::fs::create_dir_all("answer-keys")?;
    let example_path = std::path::Path::new("answer-keys/example.toml");
    if example_path.exists() {
        println!("answer-keys/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_ANSWER_KEY)?;
        println!("Created answer-keys/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Fill answer-keys/example.toml with the official key");
    println!("  2. Run: rankify validate-key --answer-key answer-keys/example.toml --session session.json");
    println!("  3. Run: rankify evaluate --session session.json --answer-key answer-keys/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# rankify configuration

output_dir = "./rankify-results"
# json, html or all
default_format = "json"

[evaluation]
# absolute tolerance when comparing numerical answers
nat_tolerance = 1e-9
# refuse to score when any key entry is missing or unparsable
require_complete_key = false
# countdown start used when a session has no testStarted event or duration
default_duration_secs = 10800
"#;

const EXAMPLE_ANSWER_KEY: &str = r#"[key]
name = "Example Mock Test"

# MCQ: one letter or number; several letters accept any of them
# MSQ: every correct option, e.g. "ACD" or "1,3,4"
# NAT: numbers and ranges joined by OR, e.g. "5 TO 10 OR -5"
# MSM: row-columns pairs, rows A.. and columns P.., e.g. "A-PQ, B-R"
# BONUS or DROPPED override any type

[answers.Physics."Section A"]
1 = "B"
2 = "ACD"
3 = "9.8 TO 9.81"

[answers.Physics."Section B"]
4 = "A-PQ, B-R, C-S, D-PT"
5 = "BONUS"
"#;
