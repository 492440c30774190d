//! Threshold rule types and config parsing.
//!
//! A [`RuleSet`] is built once from the `judge` section of a configuration
//! document and is immutable afterwards. Rule order is significant: when
//! several rules match the same run context the earliest one wins.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::JudgeError;
use crate::similarity::SimilarityMetric;
use crate::threshold_validation::validate_unit_range;
use crate::types::RunContext;

// ---------------------------------------------------------------------------
// Raw config schema
// ---------------------------------------------------------------------------

/// Top-level document. Keys other than `judge` belong to other runner stages
/// and are ignored here.
#[derive(Debug, Deserialize)]
struct ConfigDocument {
    judge: RawJudge,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawJudge {
    #[serde(default)]
    common: Option<RawCommon>,
    specifics: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCommon {
    #[serde(default, alias = "simarity_name")]
    similarity_name: Option<SimilarityMetric>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    matchs: RawMatch,
    threshold: f64,
    #[serde(default, alias = "simarity_name")]
    similarity_name: Option<SimilarityMetric>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMatch {
    target: Vec<String>,
    ptq: bool,
}

// ---------------------------------------------------------------------------
// Validated types
// ---------------------------------------------------------------------------

/// A single matching clause with its required minimum accuracy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdRule {
    pub targets: BTreeSet<String>,
    pub ptq: bool,
    pub threshold: f64,
    /// Per-rule metric override. `None` falls back to the rule set's common metric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<SimilarityMetric>,
}

impl ThresholdRule {
    /// Build a rule, validating the threshold range and target list.
    pub fn new<I, S>(targets: I, ptq: bool, threshold: f64) -> Result<Self, JudgeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rule = Self {
            targets: targets.into_iter().map(Into::into).collect(),
            ptq,
            threshold,
            similarity: None,
        };
        rule.validate("rule")?;
        Ok(rule)
    }

    pub fn with_similarity(mut self, metric: SimilarityMetric) -> Self {
        self.similarity = Some(metric);
        self
    }

    /// Returns `true` if this rule applies to `ctx`.
    pub fn matches(&self, ctx: &RunContext) -> bool {
        self.ptq == ctx.ptq && self.targets.contains(&ctx.target)
    }

    fn validate(&self, name: &str) -> Result<(), JudgeError> {
        if self.targets.is_empty() {
            return Err(JudgeError::Config(format!(
                "{name}.matchs.target must list at least one target"
            )));
        }
        if self.targets.iter().any(|t| t.trim().is_empty()) {
            return Err(JudgeError::Config(format!(
                "{name}.matchs.target must not contain empty target names"
            )));
        }
        validate_unit_range(self.threshold, &format!("{name}.threshold"))
    }
}

/// Ordered, immutable collection of threshold rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSet {
    rules: Vec<ThresholdRule>,
    common_similarity: SimilarityMetric,
}

impl RuleSet {
    /// Build a rule set from already-constructed rules.
    ///
    /// Rejects an empty rule list and re-validates every rule.
    pub fn new(
        rules: Vec<ThresholdRule>,
        common_similarity: SimilarityMetric,
    ) -> Result<Self, JudgeError> {
        if rules.is_empty() {
            return Err(JudgeError::Config(
                "judge.specifics must contain at least one rule".into(),
            ));
        }
        for (i, rule) in rules.iter().enumerate() {
            rule.validate(&format!("judge.specifics[{i}]"))?;
        }
        Ok(Self {
            rules,
            common_similarity,
        })
    }

    /// Parse the `judge` section of a YAML configuration document.
    pub fn parse(config_text: &str) -> Result<Self, JudgeError> {
        let doc: ConfigDocument = serde_yaml::from_str(config_text)?;
        Self::from_document(doc)
    }

    /// Same as [`RuleSet::parse`] for a document that has already been
    /// loaded (e.g. after merging an overwrite config).
    pub fn from_value(value: serde_yaml::Value) -> Result<Self, JudgeError> {
        let doc: ConfigDocument = serde_yaml::from_value(value)?;
        Self::from_document(doc)
    }

    fn from_document(doc: ConfigDocument) -> Result<Self, JudgeError> {
        let common_similarity = doc
            .judge
            .common
            .and_then(|c| c.similarity_name)
            .unwrap_or_default();

        let rules = doc
            .judge
            .specifics
            .into_iter()
            .map(|raw| ThresholdRule {
                targets: raw.matchs.target.into_iter().collect(),
                ptq: raw.matchs.ptq,
                threshold: raw.threshold,
                similarity: raw.similarity_name,
            })
            .collect();

        Self::new(rules, common_similarity)
    }

    /// Rules in match order.
    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    pub fn common_similarity(&self) -> SimilarityMetric {
        self.common_similarity
    }

    /// The metric that applies to runs judged by `rule`.
    pub fn similarity_for(&self, rule: &ThresholdRule) -> SimilarityMetric {
        rule.similarity.unwrap_or(self.common_similarity)
    }
}
