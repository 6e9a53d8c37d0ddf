//! The `rankify parse-answer` command.

use anyhow::Result;

use rankify_core::answer::{parse_answer, CorrectAnswer};
use rankify_core::model::{AnswerFormat, QuestionType};

pub fn execute(question_type: String, options: u32, rows: u32, columns: u32, text: String) -> Result<()> {
    let question_type: QuestionType = question_type
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;

    let format = match question_type {
        QuestionType::Mcq => AnswerFormat::Mcq { options },
        QuestionType::Msq => AnswerFormat::Msq { options },
        QuestionType::Nat => AnswerFormat::Nat,
        QuestionType::Msm => AnswerFormat::Msm { rows, columns },
    };

    let Some(answer) = parse_answer(&text, &format) else {
        anyhow::bail!("could not parse {text:?} as a {question_type} answer");
    };

    println!("Type: {question_type}");
    println!("Canonical: {answer}");

    match &answer {
        CorrectAnswer::Options(accepted) => {
            let list: Vec<String> = accepted.iter().map(u32::to_string).collect();
            println!("Options: {}", list.join(", "));
        }
        CorrectAnswer::Numeric(clauses) => {
            for clause in clauses {
                println!("Accepts: {clause}");
            }
        }
        CorrectAnswer::Matrix(mapping) => {
            for (row, columns) in mapping {
                let list: Vec<String> = columns.iter().map(u32::to_string).collect();
                println!("Row {row}: columns {}", list.join(", "));
            }
        }
        CorrectAnswer::Bonus => println!("Full marks to every attempt"),
        CorrectAnswer::Dropped => println!("Full marks to everyone"),
    }

    Ok(())
}
