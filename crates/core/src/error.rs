#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JudgeError {
    #[error("Invalid judge configuration: {0}")]
    Config(String),

    #[error("No threshold rule matches target '{target}' with ptq={ptq}")]
    NoMatch { target: String, ptq: bool },

    #[error("Measured accuracy must be between 0.0 and 1.0, got {0}")]
    InvalidMeasurement(f64),
}

impl From<serde_yaml::Error> for JudgeError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}
