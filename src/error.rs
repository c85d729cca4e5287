// Error type shared by the regression, integration and reporting layers
use thiserror::Error;

/// Errors raised by the drag pipeline.
///
/// Numerical failures are reported at the point of detection and passed up
/// unchanged; nothing in the crate retries or substitutes a default value.
#[derive(Debug, Error)]
pub enum DragError {
    /// A dataset or trajectory sample had no records.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Regression input cannot define a line (too few points or no x spread).
    #[error("insufficient data for regression: {0}")]
    InsufficientData(String),

    /// The ODE stepper failed or was handed non-finite values.
    #[error("integration failed: {0}")]
    Integration(String),

    /// A caller-supplied parameter is outside its valid domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("root not bracketed: f({a}) = {fa}, f({b}) = {fb}")]
    RootNotBracketed { a: f64, b: f64, fa: f64, fb: f64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DragError>;

impl From<String> for DragError {
    fn from(msg: String) -> Self {
        DragError::InvalidParameter(msg)
    }
}

impl From<&str> for DragError {
    fn from(msg: &str) -> Self {
        DragError::InvalidParameter(msg.to_string())
    }
}
