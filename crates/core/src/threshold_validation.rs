//! Unit-interval checks for accuracy values.
//!
//! `RuleSet` parsing rejects configured thresholds outside `[0.0, 1.0]`, and
//! `judge` rejects measured scores outside the same range.

use crate::error::JudgeError;

/// Returns `true` if `value` lies within `[0.0, 1.0]`. NaN is never in range.
pub fn is_unit_range(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

/// Validate that a configured value falls within `[0.0, 1.0]`.
///
/// Returns a `JudgeError::Config` naming the field if out of range.
pub fn validate_unit_range(value: f64, name: &str) -> Result<(), JudgeError> {
    if !is_unit_range(value) {
        return Err(JudgeError::Config(format!(
            "{name} must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(())
}
