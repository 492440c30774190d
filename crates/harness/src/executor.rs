//! Model execution seam.
//!
//! The harness never loads or runs models itself. A [`ModelExecutor`]
//! implementation (compiler + simulator, reference runtime, or a test double)
//! supplies the outputs that get measured and judged.

use std::path::Path;

use nnjudge_core::RunContext;

/// One flattened model output tensor.
pub type OutputTensor = Vec<f32>;

pub trait ModelExecutor: Send + Sync {
    /// Outputs of the reference runtime. Called once per harness run.
    fn reference(&self, model: &Path) -> anyhow::Result<Vec<OutputTensor>>;

    /// Outputs of the model compiled and executed under `ctx`, in the same
    /// order as [`ModelExecutor::reference`].
    fn execute(&self, model: &Path, ctx: &RunContext) -> anyhow::Result<Vec<OutputTensor>>;
}
