use std::fmt;

use serde::{Deserialize, Serialize};

/// The execution environment a model was run in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunContext {
    /// Device/backend identifier, e.g. `cpu`, `k210`, `k510`.
    pub target: String,
    /// Whether post-training quantization was active for the run.
    pub ptq: bool,
}

impl RunContext {
    pub fn new(target: impl Into<String>, ptq: bool) -> Self {
        Self {
            target: target.into(),
            ptq,
        }
    }
}

impl fmt::Display for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ptq {
            write!(f, "{}(ptq)", self.target)
        } else {
            f.write_str(&self.target)
        }
    }
}
