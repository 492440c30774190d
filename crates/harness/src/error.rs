use std::path::PathBuf;

use nnjudge_core::similarity::SimilarityError;
use nnjudge_core::{JudgeError, RunContext};

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Judge(#[from] JudgeError),

    #[error("Reference execution failed: {0:#}")]
    Reference(anyhow::Error),

    #[error("Model execution failed for {context}: {error:#}")]
    Execution {
        context: RunContext,
        error: anyhow::Error,
    },

    #[error("Output count mismatch for {context}: model produced {actual}, reference has {expected}")]
    OutputCountMismatch {
        context: RunContext,
        actual: usize,
        expected: usize,
    },

    #[error("Similarity failed for {context} output {output_index}: {source}")]
    Similarity {
        context: RunContext,
        output_index: usize,
        #[source]
        source: SimilarityError,
    },

    #[error("No run contexts left for case '{0}' after target filtering")]
    NothingToRun(String),

    #[error("Accuracy below threshold for case '{case_name}': {}", failed.join(", "))]
    AccuracyBelowThreshold {
        case_name: String,
        failed: Vec<String>,
    },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
