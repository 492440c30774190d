//! Rule matcher: pure logic, first match wins.

use crate::error::JudgeError;
use crate::rules::{RuleSet, ThresholdRule};
use crate::types::RunContext;

/// Return the first rule whose target set contains `ctx.target` and whose
/// `ptq` flag equals `ctx.ptq`.
pub fn match_rule<'a>(
    rule_set: &'a RuleSet,
    ctx: &RunContext,
) -> Result<&'a ThresholdRule, JudgeError> {
    match_rule_indexed(rule_set, ctx).map(|(_, rule)| rule)
}

/// Like [`match_rule`], also returning the rule's position in the rule set.
pub fn match_rule_indexed<'a>(
    rule_set: &'a RuleSet,
    ctx: &RunContext,
) -> Result<(usize, &'a ThresholdRule), JudgeError> {
    let matching = matching_rule_indices(rule_set, ctx);
    let Some((&index, shadowed)) = matching.split_first() else {
        return Err(JudgeError::NoMatch {
            target: ctx.target.clone(),
            ptq: ctx.ptq,
        });
    };
    let rule = &rule_set.rules()[index];

    tracing::debug!(
        run_target = %ctx.target,
        ptq = ctx.ptq,
        rule_index = index,
        threshold = rule.threshold,
        shadowed = ?shadowed,
        "Matched threshold rule"
    );
    Ok((index, rule))
}

/// Indices of every rule that matches `ctx`, in order.
///
/// Only the first entry is ever used for judgment; the rest are shadowed.
pub fn matching_rule_indices(rule_set: &RuleSet, ctx: &RunContext) -> Vec<usize> {
    rule_set
        .rules()
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule.matches(ctx))
        .map(|(index, _)| index)
        .collect()
}
