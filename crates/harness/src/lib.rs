//! `nnjudge-harness`: drives a model executor over a test case's run matrix
//! and judges every output against the configured accuracy thresholds.
//!
//! A regression test typically looks like:
//!
//! ```no_run
//! # use std::path::Path;
//! # use nnjudge_harness::{AccuracyHarness, HarnessSettings, ModelExecutor};
//! # fn executor() -> Box<dyn ModelExecutor> { unimplemented!() }
//! let overwrite = r#"
//!     judge:
//!       specifics:
//!         - matchs: {target: [k510], ptq: true}
//!           threshold: 0.93
//! "#;
//! let settings = HarnessSettings::from_env();
//! nnjudge_harness::logging::init(settings.log_format);
//! let harness = AccuracyHarness::new("test_yolox", overwrite, settings)?;
//! harness.run_checked(Path::new("yolox_nano_224.onnx"), executor().as_ref())?;
//! # Ok::<(), nnjudge_harness::HarnessError>(())
//! ```

pub mod error;
pub mod executor;
pub mod logging;
pub mod report;
pub mod runner;
pub mod settings;

pub use error::HarnessError;
pub use executor::{ModelExecutor, OutputTensor};
pub use report::{HarnessReport, JudgeSummary, RunOutcome};
pub use runner::AccuracyHarness;
pub use settings::HarnessSettings;
