//! Configuration layering: built-in defaults plus per-test overwrites.
//!
//! Test cases supply a small YAML overwrite (usually just a few
//! `judge.specifics` rules). It is merged onto a base document before the
//! [`RuleSet`](crate::rules::RuleSet) and [`CaseConfig`] are built.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::JudgeError;
use crate::types::RunContext;

/// Base configuration used when no config file is supplied.
pub const DEFAULT_CONFIG: &str = r#"
judge:
  common:
    similarity_name: cosine
  specifics:
    - matchs:
        target: [cpu, k210, k510]
        ptq: false
      threshold: 0.999
    - matchs:
        target: [cpu, k210, k510]
        ptq: true
      threshold: 0.98
case:
  targets: [cpu, k210, k510]
  ptq: [false, true]
"#;

/// Path of the rule list whose overwrite entries are prepended rather than
/// replacing the base list.
const SPECIFICS_PATH: [&str; 2] = ["judge", "specifics"];

/// Misspelled key accepted in place of `similarity_name`.
const SIMILARITY_ALIAS: &str = "simarity_name";
const SIMILARITY_KEY: &str = "similarity_name";

/// Parse YAML text into a document, tolerating a uniform leading indent.
///
/// An empty document parses as an empty mapping. `simarity_name` under
/// `judge.common` and under each `judge.specifics` rule is renamed to
/// `similarity_name`, so layered documents never carry both spellings.
pub fn load_document(text: &str) -> Result<Value, JudgeError> {
    let mut value: Value = serde_yaml::from_str(&strip_common_indent(text))?;
    match &value {
        Value::Null => return Ok(Value::Mapping(Mapping::new())),
        Value::Mapping(_) => {}
        other => {
            return Err(JudgeError::Config(format!(
                "configuration must be a mapping, got {}",
                value_kind(other)
            )))
        }
    }
    normalize_similarity_alias(&mut value);
    Ok(value)
}

fn normalize_similarity_alias(doc: &mut Value) {
    let Some(judge) = doc.get_mut("judge") else {
        return;
    };
    if let Some(Value::Mapping(common)) = judge.get_mut("common") {
        rename_alias(common);
    }
    if let Some(Value::Sequence(rules)) = judge.get_mut("specifics") {
        for rule in rules.iter_mut() {
            if let Value::Mapping(rule) = rule {
                rename_alias(rule);
            }
        }
    }
}

// A mapping spelling both keys is left alone; deserialization reports it.
fn rename_alias(map: &mut Mapping) {
    if map.contains_key(SIMILARITY_KEY) {
        return;
    }
    if let Some(metric) = map.remove(SIMILARITY_ALIAS) {
        map.insert(Value::from(SIMILARITY_KEY), metric);
    }
}

/// Merge `overwrite` onto `base` and return the combined document.
///
/// Mappings merge key by key. Scalars and sequences in the overwrite replace
/// the base value, except `judge.specifics`: overwrite rules are placed in
/// front of the base rules so they win under first-match ordering, while base
/// rules still cover contexts the overwrite does not mention.
pub fn merge_overwrite(base: &str, overwrite: &str) -> Result<Value, JudgeError> {
    let mut merged = load_document(base)?;
    let overwrite = load_document(overwrite)?;
    merge_value(&mut merged, overwrite, &mut Vec::new());
    Ok(merged)
}

fn merge_value(base: &mut Value, overwrite: Value, path: &mut Vec<String>) {
    match (base, overwrite) {
        (Value::Mapping(base_map), Value::Mapping(over_map)) => {
            for (key, over_val) in over_map {
                let Some(existing) = base_map.get_mut(&key) else {
                    base_map.insert(key, over_val);
                    continue;
                };
                path.push(key.as_str().unwrap_or_default().to_string());
                merge_value(existing, over_val, path);
                path.pop();
            }
        }
        (Value::Sequence(base_seq), Value::Sequence(mut over_seq)) if *path == SPECIFICS_PATH => {
            over_seq.append(base_seq);
            *base_seq = over_seq;
        }
        (slot, value) => *slot = value,
    }
}

fn strip_common_indent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

// ---------------------------------------------------------------------------
// Case matrix
// ---------------------------------------------------------------------------

fn default_ptq_modes() -> Vec<bool> {
    vec![false, true]
}

/// The `case` section: which run contexts a test case is executed in.
///
/// Other keys in `case` configure compile/import stages and are ignored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseConfig {
    pub targets: Vec<String>,
    #[serde(default = "default_ptq_modes")]
    pub ptq: Vec<bool>,
}

impl CaseConfig {
    /// Read the `case` section of a loaded document.
    pub fn from_document(doc: &Value) -> Result<Self, JudgeError> {
        let section = doc
            .get("case")
            .cloned()
            .ok_or_else(|| JudgeError::Config("missing `case` section".into()))?;
        let case: Self = serde_yaml::from_value(section)?;
        if case.targets.is_empty() {
            return Err(JudgeError::Config(
                "case.targets must list at least one target".into(),
            ));
        }
        if case.ptq.is_empty() {
            return Err(JudgeError::Config(
                "case.ptq must list at least one mode".into(),
            ));
        }
        Ok(case)
    }

    /// Keep only targets accepted by `filter`, preserving config order.
    pub fn retain_targets(&mut self, filter: &[String]) {
        self.targets.retain(|t| filter.contains(t));
    }

    /// Every (target, ptq) pair, targets outer and ptq modes inner.
    pub fn run_contexts(&self) -> Vec<RunContext> {
        self.targets
            .iter()
            .flat_map(|target| self.ptq.iter().map(|&ptq| RunContext::new(target.clone(), ptq)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;
    use crate::similarity::SimilarityMetric;
    use assert_matches::assert_matches;

    const YOLOX_OVERWRITE: &str = r#"
     judge:
       specifics:
         - matchs:
             target: [cpu]
             ptq: true
           threshold: 0.8
         - matchs:
             target: [k510]
             ptq: false
           threshold: 0.99
     "#;

    #[test]
    fn default_config_is_valid() {
        let doc = load_document(DEFAULT_CONFIG).unwrap();
        let rules = RuleSet::from_value(doc.clone()).unwrap();
        assert_eq!(rules.rules().len(), 2);
        assert_eq!(rules.common_similarity(), SimilarityMetric::Cosine);

        let case = CaseConfig::from_document(&doc).unwrap();
        assert_eq!(case.run_contexts().len(), 6);
    }

    #[test]
    fn indented_overwrite_is_accepted() {
        let doc = load_document(YOLOX_OVERWRITE).unwrap();
        assert!(doc.get("judge").is_some());
    }

    #[test]
    fn empty_overwrite_leaves_base_untouched() {
        let merged = merge_overwrite(DEFAULT_CONFIG, "").unwrap();
        assert_eq!(merged, load_document(DEFAULT_CONFIG).unwrap());
    }

    #[test]
    fn overwrite_rules_precede_base_rules() {
        let merged = merge_overwrite(DEFAULT_CONFIG, YOLOX_OVERWRITE).unwrap();
        let rules = RuleSet::from_value(merged).unwrap();
        let thresholds: Vec<f64> = rules.rules().iter().map(|r| r.threshold).collect();
        assert_eq!(thresholds, vec![0.8, 0.99, 0.999, 0.98]);
    }

    #[test]
    fn overwrite_keeps_unrelated_base_sections() {
        let merged = merge_overwrite(DEFAULT_CONFIG, YOLOX_OVERWRITE).unwrap();
        let rules = RuleSet::from_value(merged.clone()).unwrap();
        assert_eq!(rules.common_similarity(), SimilarityMetric::Cosine);
        assert!(CaseConfig::from_document(&merged).is_ok());
    }

    #[test]
    fn overwrite_replaces_scalars_and_other_sequences() {
        let merged = merge_overwrite(
            DEFAULT_CONFIG,
            "judge:\n  common:\n    similarity_name: euclidean\ncase:\n  targets: [k510]\n",
        )
        .unwrap();
        let rules = RuleSet::from_value(merged.clone()).unwrap();
        assert_eq!(rules.common_similarity(), SimilarityMetric::Euclidean);

        let case = CaseConfig::from_document(&merged).unwrap();
        assert_eq!(case.targets, vec!["k510".to_string()]);
        assert_eq!(case.ptq, vec![false, true]);
    }

    #[test]
    fn misspelled_similarity_key_overrides_base_common() {
        let merged = merge_overwrite(
            DEFAULT_CONFIG,
            "judge:\n  common:\n    simarity_name: euclidean\n",
        )
        .unwrap();
        let rules = RuleSet::from_value(merged).unwrap();
        assert_eq!(rules.common_similarity(), SimilarityMetric::Euclidean);
    }

    #[test]
    fn misspelled_similarity_key_is_renamed_in_rules() {
        let doc = load_document(
            "judge:\n  specifics:\n    - matchs: {target: [cpu], ptq: true}\n      threshold: 0.8\n      simarity_name: euclidean\n",
        )
        .unwrap();
        let rule = &doc["judge"]["specifics"][0];
        assert_eq!(rule.get("similarity_name"), Some(&Value::from("euclidean")));
        assert!(rule.get("simarity_name").is_none());

        let rules = RuleSet::from_value(doc).unwrap();
        assert_eq!(rules.similarity_for(&rules.rules()[0]), SimilarityMetric::Euclidean);
    }

    #[test]
    fn rejects_non_mapping_documents() {
        assert_matches!(load_document("- a\n- b\n"), Err(JudgeError::Config(msg)) if msg.contains("sequence"));
        assert_matches!(merge_overwrite(DEFAULT_CONFIG, "judge: ["), Err(JudgeError::Config(_)));
    }

    #[test]
    fn run_contexts_are_target_major() {
        let case = CaseConfig {
            targets: vec!["cpu".into(), "k510".into()],
            ptq: vec![false, true],
        };
        assert_eq!(
            case.run_contexts(),
            vec![
                RunContext::new("cpu", false),
                RunContext::new("cpu", true),
                RunContext::new("k510", false),
                RunContext::new("k510", true),
            ]
        );
    }

    #[test]
    fn retain_targets_preserves_order() {
        let mut case = CaseConfig {
            targets: vec!["cpu".into(), "k210".into(), "k510".into()],
            ptq: vec![true],
        };
        case.retain_targets(&["k510".to_string(), "cpu".to_string()]);
        assert_eq!(case.targets, vec!["cpu".to_string(), "k510".to_string()]);
    }

    #[test]
    fn case_section_is_required() {
        let doc = load_document("judge:\n  specifics: []\n").unwrap();
        assert_matches!(CaseConfig::from_document(&doc), Err(JudgeError::Config(_)));
    }

    #[test]
    fn case_ignores_stage_options() {
        let doc = load_document(
            "case:\n  targets: [cpu]\n  compile_opt:\n    dump_asm: true\n",
        )
        .unwrap();
        let case = CaseConfig::from_document(&doc).unwrap();
        assert_eq!(case.run_contexts(), vec![RunContext::new("cpu", false), RunContext::new("cpu", true)]);
    }
}
