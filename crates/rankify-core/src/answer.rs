//! Correct-answer values and the answer-key text parser.
//!
//! Instructors type answer keys the way exam bodies publish them: `C`,
//! `ABD`, `5 to 10 or -5`, `A-PQT, B-QSU`, `BONUS`. [`parse_answer`] turns
//! such text into a [`CorrectAnswer`] for a given [`AnswerFormat`], and the
//! `Display` impl writes the canonical form back so the two round-trip.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::model::AnswerFormat;

/// Column letters start at `P` (`P` is column 1, `Z` column 11, then `A`).
const COLUMN_LETTER_OFFSET: u32 = 15;

const ALPHABET_LEN: u32 = 26;

/// A parsed answer-key entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectAnswer {
    /// MCQ/MSQ: acceptable option indices, ascending and deduplicated.
    Options(Vec<u32>),
    /// NAT: exact targets and inclusive ranges, any of which is correct.
    Numeric(Vec<NatClause>),
    /// MSM: row index to correct column set; absent rows are empty.
    Matrix(BTreeMap<u32, BTreeSet<u32>>),
    /// Question withdrawn; everyone receives full marks.
    Dropped,
    /// Question declared bonus; full marks for every attempt.
    Bonus,
}

impl CorrectAnswer {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            CorrectAnswer::Options(_) => "option",
            CorrectAnswer::Numeric(_) => "numeric",
            CorrectAnswer::Matrix(_) => "matrix",
            CorrectAnswer::Dropped => "dropped",
            CorrectAnswer::Bonus => "bonus",
        }
    }
}

/// One alternative of a numerical answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NatClause {
    Exact(f64),
    /// Inclusive on both ends, `low <= high`.
    Range { low: f64, high: f64 },
}

impl NatClause {
    /// Returns `true` if `value` satisfies this clause within `tolerance`.
    pub fn matches(&self, value: f64, tolerance: f64) -> bool {
        match *self {
            NatClause::Exact(target) => (value - target).abs() <= tolerance,
            NatClause::Range { low, high } => value >= low - tolerance && value <= high + tolerance,
        }
    }
}

/// Parse instructor text into a correct answer for `format`.
///
/// Returns `None` when the text cannot be read unambiguously; callers treat
/// that as an incomplete answer key rather than an error.
pub fn parse_answer(raw: &str, format: &AnswerFormat) -> Option<CorrectAnswer> {
    let text = raw.trim().to_uppercase();
    if text.is_empty() {
        return None;
    }
    if text.contains("BONUS") {
        return Some(CorrectAnswer::Bonus);
    }
    if text.contains("DROPPED") {
        return Some(CorrectAnswer::Dropped);
    }

    match *format {
        AnswerFormat::Mcq { options } | AnswerFormat::Msq { options } => {
            parse_options(&text, options)
        }
        AnswerFormat::Nat => parse_numeric(&text),
        AnswerFormat::Msm { rows, columns } => parse_matrix(&text, rows, columns),
    }
}

fn option_value(c: char) -> Option<u32> {
    match c {
        'A'..='Z' => Some(c as u32 - 'A' as u32 + 1),
        '1'..='9' => c.to_digit(10),
        _ => None,
    }
}

fn parse_options(text: &str, options: u32) -> Option<CorrectAnswer> {
    let picked: BTreeSet<u32> = text
        .chars()
        .filter_map(option_value)
        .filter(|&v| v <= options)
        .collect();

    if picked.is_empty() {
        None
    } else {
        Some(CorrectAnswer::Options(picked.into_iter().collect()))
    }
}

fn parse_numeric(text: &str) -> Option<CorrectAnswer> {
    let clauses = text
        .split(',')
        .flat_map(|part| part.split("OR"))
        .map(parse_nat_clause)
        .collect::<Option<Vec<_>>>()?;

    if clauses.is_empty() {
        None
    } else {
        Some(CorrectAnswer::Numeric(clauses))
    }
}

fn parse_nat_clause(clause: &str) -> Option<NatClause> {
    let clause = clause.trim();
    match clause.split_once("TO") {
        Some((a, b)) => {
            let a = parse_decimal(a.trim())?;
            let b = parse_decimal(b.trim())?;
            Some(NatClause::Range {
                low: a.min(b),
                high: a.max(b),
            })
        }
        None => parse_decimal(clause).map(NatClause::Exact),
    }
}

/// Accepts `-?digits(.digits)?` and nothing else.
fn parse_decimal(s: &str) -> Option<f64> {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };
    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !frac_part.map_or(true, all_digits) {
        return None;
    }
    s.parse().ok()
}

fn row_value(c: char, rows: u32) -> Option<u32> {
    match c {
        'A'..='Z' => Some((c as u32 - 'A' as u32) % rows + 1),
        '1'..='9' => c.to_digit(10).filter(|&d| d <= rows),
        _ => None,
    }
}

fn column_value(c: char, columns: u32) -> Option<u32> {
    match c {
        'A'..='Z' => {
            let shifted = (c as u32 - 'A' as u32 + ALPHABET_LEN - COLUMN_LETTER_OFFSET) % ALPHABET_LEN;
            Some(shifted % columns + 1)
        }
        '1'..='9' => c.to_digit(10).filter(|&d| d <= columns),
        _ => None,
    }
}

fn parse_matrix(text: &str, rows: u32, columns: u32) -> Option<CorrectAnswer> {
    if rows == 0 || columns == 0 {
        return None;
    }

    let mut mapping: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
    for clause in text.split(',') {
        let clause: String = clause.chars().filter(|c| !c.is_whitespace()).collect();
        let (row_token, column_tokens) = clause.split_once('-')?;

        let mut row_chars = row_token.chars();
        let (Some(row_char), None) = (row_chars.next(), row_chars.next()) else {
            return None;
        };
        let row = row_value(row_char, rows)?;

        if column_tokens.is_empty() {
            return None;
        }
        let selected = column_tokens
            .chars()
            .map(|c| column_value(c, columns))
            .collect::<Option<BTreeSet<_>>>()?;

        mapping.entry(row).or_default().extend(selected);
    }

    Some(CorrectAnswer::Matrix(mapping))
}

fn alphabet_letter(index: u32) -> char {
    char::from_u32('A' as u32 + index % ALPHABET_LEN).unwrap_or('?')
}

impl fmt::Display for NatClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NatClause::Exact(v) => write!(f, "{v}"),
            NatClause::Range { low, high } => write!(f, "{low} TO {high}"),
        }
    }
}

impl fmt::Display for CorrectAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectAnswer::Options(options) => {
                for &v in options {
                    write!(f, "{}", alphabet_letter(v.saturating_sub(1)))?;
                }
                Ok(())
            }
            CorrectAnswer::Numeric(clauses) => {
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" OR ")?;
                    }
                    write!(f, "{clause}")?;
                }
                Ok(())
            }
            CorrectAnswer::Matrix(mapping) => {
                for (i, (row, columns)) in mapping.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}-", alphabet_letter(row.saturating_sub(1)))?;
                    for column in columns {
                        let index = column.saturating_sub(1) + COLUMN_LETTER_OFFSET;
                        write!(f, "{}", alphabet_letter(index))?;
                    }
                }
                Ok(())
            }
            CorrectAnswer::Dropped => f.write_str("DROPPED"),
            CorrectAnswer::Bonus => f.write_str("BONUS"),
        }
    }
}
