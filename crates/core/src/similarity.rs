//! Output similarity metrics.
//!
//! Turns an (actual, expected) output pair into an accuracy score in
//! `[0.0, 1.0]` where higher is better. Computation is done in `f64`
//! regardless of the `f32` tensor element type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Metric used to compare a model output against its reference output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    /// Cosine of the angle between the flattened outputs.
    #[default]
    Cosine,
    /// `1 / (1 + d)` where `d` is the euclidean distance between the outputs.
    Euclidean,
}

impl SimilarityMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
        }
    }

    /// Score `actual` against `expected`.
    pub fn measure(self, actual: &[f32], expected: &[f32]) -> Result<f64, SimilarityError> {
        check_comparable(actual, expected)?;
        let score = match self {
            Self::Cosine => cosine(actual, expected),
            Self::Euclidean => euclidean(actual, expected),
        };
        Ok(score)
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimilarityError {
    #[error("Output length mismatch: actual has {actual} elements, expected has {expected}")]
    LengthMismatch { actual: usize, expected: usize },

    #[error("Cannot compare empty outputs")]
    Empty,

    #[error("Output contains a non-finite value at index {index}")]
    NonFinite { index: usize },
}

fn check_comparable(actual: &[f32], expected: &[f32]) -> Result<(), SimilarityError> {
    if actual.len() != expected.len() {
        return Err(SimilarityError::LengthMismatch {
            actual: actual.len(),
            expected: expected.len(),
        });
    }
    if actual.is_empty() {
        return Err(SimilarityError::Empty);
    }
    let non_finite = actual
        .iter()
        .zip(expected)
        .position(|(a, e)| !a.is_finite() || !e.is_finite());
    if let Some(index) = non_finite {
        return Err(SimilarityError::NonFinite { index });
    }
    Ok(())
}

/// Anti-correlated outputs score zero. Two all-zero outputs are identical.
fn cosine(actual: &[f32], expected: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_e = 0.0f64;
    for (&a, &e) in actual.iter().zip(expected) {
        let (a, e) = (f64::from(a), f64::from(e));
        dot += a * e;
        norm_a += a * a;
        norm_e += e * e;
    }

    match (norm_a == 0.0, norm_e == 0.0) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => (dot / (norm_a.sqrt() * norm_e.sqrt())).clamp(0.0, 1.0),
    }
}

fn euclidean(actual: &[f32], expected: &[f32]) -> f64 {
    let distance = actual
        .iter()
        .zip(expected)
        .map(|(&a, &e)| {
            let d = f64::from(a) - f64::from(e);
            d * d
        })
        .sum::<f64>()
        .sqrt();
    1.0 / (1.0 + distance)
}
