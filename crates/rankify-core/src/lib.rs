//! rankify-core: answer parsing, evaluation, aggregation and journey
//! reconstruction.
//!
//! This crate defines the data model of a submitted CBT session and the
//! scoring pipeline the rest of Rankify builds on.

pub mod answer;
pub mod answer_key;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod journey;
pub mod model;
pub mod report;
pub mod results;
pub mod statistics;
