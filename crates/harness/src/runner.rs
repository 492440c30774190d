//! Accuracy harness: runs a model over the case matrix and judges every output.

use std::path::Path;

use nnjudge_core::config::{merge_overwrite, CaseConfig};
use nnjudge_core::{judge, match_rule, RuleSet, RunContext};

use crate::error::HarnessError;
use crate::executor::{ModelExecutor, OutputTensor};
use crate::report::{HarnessReport, OutputVerdict, RunOutcome};
use crate::settings::HarnessSettings;

/// One test case's judging setup.
///
/// Built once per test from the base configuration and the test's overwrite
/// configuration; immutable afterwards.
#[derive(Debug, Clone)]
pub struct AccuracyHarness {
    case_name: String,
    rules: RuleSet,
    case: CaseConfig,
    settings: HarnessSettings,
}

impl AccuracyHarness {
    /// Merge `overwrite_config` onto the base configuration and build the
    /// rule set and run matrix.
    pub fn new(
        case_name: impl Into<String>,
        overwrite_config: &str,
        settings: HarnessSettings,
    ) -> Result<Self, HarnessError> {
        let case_name = case_name.into();
        let base = settings.base_config_text()?;
        let doc = merge_overwrite(&base, overwrite_config)?;

        let rules = RuleSet::from_value(doc.clone())?;
        let mut case = CaseConfig::from_document(&doc)?;
        if let Some(filter) = &settings.target_filter {
            case.retain_targets(filter);
        }

        tracing::info!(
            case_name = %case_name,
            rule_count = rules.rules().len(),
            targets = ?case.targets,
            "Harness configured"
        );

        Ok(Self {
            case_name,
            rules,
            case,
            settings,
        })
    }

    pub fn case_name(&self) -> &str {
        &self.case_name
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The run matrix: targets outer, ptq modes inner, in config order.
    pub fn run_contexts(&self) -> Vec<RunContext> {
        self.case.run_contexts()
    }

    /// Execute and judge `model` in every run context.
    ///
    /// Reference outputs are obtained once. Any error aborts the whole run;
    /// accuracy failures do not, they are recorded in the report.
    pub fn run(
        &self,
        model: &Path,
        executor: &dyn ModelExecutor,
    ) -> Result<HarnessReport, HarnessError> {
        let contexts = self.run_contexts();
        if contexts.is_empty() {
            return Err(HarnessError::NothingToRun(self.case_name.clone()));
        }

        let reference = executor.reference(model).map_err(HarnessError::Reference)?;
        if reference.is_empty() {
            return Err(HarnessError::Reference(anyhow::anyhow!(
                "reference runtime produced no outputs for {}",
                model.display()
            )));
        }

        let mut outcomes = Vec::with_capacity(contexts.len());
        for ctx in contexts {
            outcomes.push(self.run_one(model, ctx, &reference, executor)?);
        }

        let report = HarnessReport {
            case_name: self.case_name.clone(),
            model: model.to_path_buf(),
            generated_at: chrono::Utc::now(),
            outcomes,
        };

        let summary = report.summary();
        tracing::info!(
            case_name = %self.case_name,
            total_runs = summary.total_runs,
            passed = summary.passed,
            failed = summary.failed,
            "Case judged"
        );
        Ok(report)
    }

    /// [`AccuracyHarness::run`], then write the report under the configured
    /// output directory and fail if any run is below threshold.
    pub fn run_checked(
        &self,
        model: &Path,
        executor: &dyn ModelExecutor,
    ) -> Result<HarnessReport, HarnessError> {
        let report = self.run(model, executor)?;
        let path = report.write_to_dir(&self.settings.output_dir)?;
        tracing::info!(path = %path.display(), "Judge report written");
        report.ensure_passed()?;
        Ok(report)
    }

    fn run_one(
        &self,
        model: &Path,
        ctx: RunContext,
        reference: &[OutputTensor],
        executor: &dyn ModelExecutor,
    ) -> Result<RunOutcome, HarnessError> {
        // Configuration gaps fail before the model is executed.
        let rule = match_rule(&self.rules, &ctx)?;
        let metric = self.rules.similarity_for(rule);

        let actual = executor
            .execute(model, &ctx)
            .map_err(|error| HarnessError::Execution {
                context: ctx.clone(),
                error,
            })?;
        if actual.len() != reference.len() {
            return Err(HarnessError::OutputCountMismatch {
                context: ctx,
                actual: actual.len(),
                expected: reference.len(),
            });
        }

        let mut outputs = Vec::with_capacity(actual.len());
        for (output_index, (out, expected)) in actual.iter().zip(reference).enumerate() {
            let measured =
                metric
                    .measure(out, expected)
                    .map_err(|source| HarnessError::Similarity {
                        context: ctx.clone(),
                        output_index,
                        source,
                    })?;
            let verdict = judge(&self.rules, &ctx, measured)?;

            if verdict.passed {
                tracing::info!(
                    run = %ctx,
                    output_index,
                    similarity = %metric,
                    measured,
                    threshold = verdict.threshold,
                    "Output passed"
                );
            } else {
                tracing::warn!(
                    run = %ctx,
                    output_index,
                    similarity = %metric,
                    measured,
                    threshold = verdict.threshold,
                    "Output below threshold"
                );
            }

            outputs.push(OutputVerdict {
                output_index,
                similarity: metric,
                verdict,
            });
        }

        Ok(RunOutcome::new(ctx, outputs))
    }
}
