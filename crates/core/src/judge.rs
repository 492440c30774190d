//! Accuracy judgment: compare a measured score against the matched threshold.
//!
//! Pure and idempotent. The caller measures accuracy; the judge only decides.

use serde::Serialize;

use crate::error::JudgeError;
use crate::matcher::match_rule_indexed;
use crate::rules::{RuleSet, ThresholdRule};
use crate::threshold_validation::is_unit_range;
use crate::types::RunContext;

/// Outcome of judging one measured accuracy score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub passed: bool,
    pub measured: f64,
    pub threshold: f64,
    /// Position of `matched_rule` within the rule set.
    pub rule_index: usize,
    pub matched_rule: ThresholdRule,
}

/// Judge `measured` for `ctx` against `rule_set`.
///
/// A missing rule is reported before the measurement is inspected; it is a
/// configuration gap, not a measurement failure. Out-of-range measurements are
/// rejected, never clamped. The threshold is inclusive.
pub fn judge(rule_set: &RuleSet, ctx: &RunContext, measured: f64) -> Result<Verdict, JudgeError> {
    let (rule_index, rule) = match_rule_indexed(rule_set, ctx)?;

    if !is_unit_range(measured) {
        return Err(JudgeError::InvalidMeasurement(measured));
    }

    Ok(Verdict {
        passed: measured >= rule.threshold,
        measured,
        threshold: rule.threshold,
        rule_index,
        matched_rule: rule.clone(),
    })
}
