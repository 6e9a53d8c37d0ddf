//! The `rankify validate-key` command.

use std::path::PathBuf;

use anyhow::Result;

use rankify_core::answer_key::{load_answer_key, validate_answer_key};
use rankify_core::model::TestSession;

pub fn execute(key_path: PathBuf, session_path: Option<PathBuf>) -> Result<()> {
    let key = load_answer_key(&key_path)?;
    let session = session_path
        .as_deref()
        .map(TestSession::load_json)
        .transpose()?;

    println!(
        "Answer key: {} ({} entries)",
        key.name.as_deref().unwrap_or("unnamed"),
        key.len()
    );
    if let Some(session) = &session {
        println!(
            "Session: {} ({} questions)",
            session.name,
            session.question_count()
        );
    }

    let warnings = validate_answer_key(&key, session.as_ref());
    for w in &warnings {
        println!("  WARNING: {w}");
    }

    if warnings.is_empty() {
        println!("Answer key valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
