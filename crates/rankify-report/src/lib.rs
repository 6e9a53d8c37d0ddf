//! rankify-report: report rendering for scored tests.
//!
//! JSON persistence lives on `rankify_core::report::TestReport`; this crate
//! renders the human-facing formats.

pub mod html;
