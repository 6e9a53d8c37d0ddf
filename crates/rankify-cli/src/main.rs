//! rankify CLI: score CBT mock tests against an answer key.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "rankify", version, about = "CBT mock-test scoring and analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a submitted session against an answer key
    Evaluate {
        /// Session JSON exported by the test interface
        #[arg(long)]
        session: PathBuf,

        /// Answer key (.toml or .json)
        #[arg(long)]
        answer_key: PathBuf,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, all
        #[arg(long)]
        format: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fail when any answer-key entry is missing or invalid
        #[arg(long)]
        require_complete_key: bool,
    },

    /// Check an answer key, optionally against the session it will score
    ValidateKey {
        /// Answer key (.toml or .json)
        #[arg(long)]
        answer_key: PathBuf,

        /// Session JSON to check the key against
        #[arg(long)]
        session: Option<PathBuf>,
    },

    /// Show how an answer-key entry is interpreted
    ParseAnswer {
        /// Question type: mcq, msq, nat, msm
        #[arg(long = "type")]
        question_type: String,

        /// Number of options (MCQ/MSQ)
        #[arg(long, default_value = "4")]
        options: u32,

        /// Number of rows (MSM)
        #[arg(long, default_value = "4")]
        rows: u32,

        /// Number of columns (MSM)
        #[arg(long, default_value = "5")]
        columns: u32,

        /// The answer text, e.g. "ACD", "5 TO 10", "A-PQ, B-R"
        text: String,
    },

    /// Compare two attempt reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Marks drop tolerated before a subject counts as regressed
        #[arg(long, default_value = "0.0")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create starter config and example answer key
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rankify=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            session,
            answer_key,
            output,
            format,
            config,
            require_complete_key,
        } => commands::evaluate::execute(
            session,
            answer_key,
            output,
            format,
            config,
            require_complete_key,
        ),
        Commands::ValidateKey {
            answer_key,
            session,
        } => commands::validate_key::execute(answer_key, session),
        Commands::ParseAnswer {
            question_type,
            options,
            rows,
            columns,
            text,
        } => commands::parse_answer::execute(question_type, options, rows, columns, text),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
