//! `nnjudge-core`: threshold-judged accuracy evaluation.
//!
//! Pure logic only. Model execution and reporting live in the harness crate
//! and the test framework that drives it.

pub mod config;
pub mod error;
pub mod judge;
pub mod matcher;
pub mod rules;
pub mod similarity;
pub mod threshold_validation;
pub mod types;

pub use error::JudgeError;
pub use judge::{judge, Verdict};
pub use matcher::match_rule;
pub use rules::{RuleSet, ThresholdRule};
pub use types::RunContext;
