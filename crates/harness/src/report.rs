//! Per-case judgment report and summary.

use std::path::{Path, PathBuf};

use serde::Serialize;

use nnjudge_core::similarity::SimilarityMetric;
use nnjudge_core::{RunContext, Verdict};

use crate::error::HarnessError;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// File name of the JSON report inside a case's output directory.
pub const REPORT_FILE_NAME: &str = "judge_report.json";

/// Verdict for one output tensor of one run.
#[derive(Debug, Clone, Serialize)]
pub struct OutputVerdict {
    pub output_index: usize,
    pub similarity: SimilarityMetric,
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Result of running and judging the model in one run context.
///
/// A run passes only if every output passes.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub context: RunContext,
    pub outputs: Vec<OutputVerdict>,
    pub passed: bool,
}

impl RunOutcome {
    pub fn new(context: RunContext, outputs: Vec<OutputVerdict>) -> Self {
        let passed = outputs.iter().all(|o| o.verdict.passed);
        Self {
            context,
            outputs,
            passed,
        }
    }
}

/// Aggregated counts across all runs of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JudgeSummary {
    pub total_runs: usize,
    pub passed: usize,
    pub failed: usize,
    pub total_outputs: usize,
    pub failed_outputs: usize,
}

/// Compute a summary from a slice of run outcomes.
pub fn compute_summary(outcomes: &[RunOutcome]) -> JudgeSummary {
    let passed = outcomes.iter().filter(|o| o.passed).count();
    let total_outputs = outcomes.iter().map(|o| o.outputs.len()).sum();
    let failed_outputs = outcomes
        .iter()
        .flat_map(|o| &o.outputs)
        .filter(|v| !v.verdict.passed)
        .count();

    JudgeSummary {
        total_runs: outcomes.len(),
        passed,
        failed: outcomes.len() - passed,
        total_outputs,
        failed_outputs,
    }
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    case_name: &'a str,
    model: &'a Path,
    generated_at: Timestamp,
    passed: bool,
    summary: JudgeSummary,
    outcomes: &'a [RunOutcome],
}

#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub case_name: String,
    pub model: PathBuf,
    pub generated_at: Timestamp,
    pub outcomes: Vec<RunOutcome>,
}

impl HarnessReport {
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn summary(&self) -> JudgeSummary {
        compute_summary(&self.outcomes)
    }

    /// Run contexts with at least one failing output, in run order.
    pub fn failed_contexts(&self) -> Vec<&RunContext> {
        self.outcomes
            .iter()
            .filter(|o| !o.passed)
            .map(|o| &o.context)
            .collect()
    }

    /// Pretty-printed JSON including the summary.
    pub fn to_json(&self) -> Result<String, HarnessError> {
        let document = ReportDocument {
            case_name: &self.case_name,
            model: &self.model,
            generated_at: self.generated_at,
            passed: self.passed(),
            summary: self.summary(),
            outcomes: &self.outcomes,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Write the JSON report to `<dir>/<case_name>/judge_report.json`.
    ///
    /// Returns the path written.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, HarnessError> {
        let case_dir = dir.join(case_dir_name(&self.case_name));
        std::fs::create_dir_all(&case_dir).map_err(|source| HarnessError::Io {
            path: case_dir.clone(),
            source,
        })?;

        let path = case_dir.join(REPORT_FILE_NAME);
        std::fs::write(&path, self.to_json()?).map_err(|source| HarnessError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Turn a failed report into an error suitable for a test assertion.
    pub fn ensure_passed(&self) -> Result<(), HarnessError> {
        if self.passed() {
            return Ok(());
        }
        let failed = self
            .outcomes
            .iter()
            .filter(|o| !o.passed)
            .map(describe_failure)
            .collect();
        Err(HarnessError::AccuracyBelowThreshold {
            case_name: self.case_name.clone(),
            failed,
        })
    }
}

fn describe_failure(outcome: &RunOutcome) -> String {
    let worst = outcome
        .outputs
        .iter()
        .filter(|o| !o.verdict.passed)
        .min_by(|a, b| a.verdict.measured.total_cmp(&b.verdict.measured));
    match worst {
        Some(o) => format!(
            "{} output {} {} {:.6} < {}",
            outcome.context, o.output_index, o.similarity, o.verdict.measured, o.verdict.threshold
        ),
        None => outcome.context.to_string(),
    }
}

/// Case names come from test ids such as `test_yolox[cpu]`.
fn case_dir_name(case_name: &str) -> String {
    case_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
