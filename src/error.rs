//! Error types for the model selection pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur across the pipeline stages.
///
/// Fit failures are a per-candidate condition: the grid search recovers from
/// them locally and continues. Every other variant fails the call that
/// produced it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Model has not been fitted yet.
    #[error("model must be fitted before forecasting")]
    FitRequired,

    /// A single candidate fit failed numerically. Recoverable inside the
    /// grid search; terminal anywhere else.
    #[error("fit failure: {0}")]
    FitFailure(String),

    /// Every candidate in a search failed to fit.
    #[error("no viable model: all {attempted} candidates failed to fit")]
    NoViableModel { attempted: usize },

    /// A persisted model was requested under an unknown name.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// Object storage collaborator failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// CSV parsing or writing failure.
    #[error("csv error: {0}")]
    Csv(String),

    /// Filesystem I/O failure.
    #[error("io error: {0}")]
    Io(String),

    /// Model serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = PipelineError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = PipelineError::InsufficientData { needed: 10, got: 5 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 10, got 5"
        );

        let err = PipelineError::NoViableModel { attempted: 36 };
        assert_eq!(
            err.to_string(),
            "no viable model: all 36 candidates failed to fit"
        );

        let err = PipelineError::ModelNotFound("ARIMA_Tuned".to_string());
        assert_eq!(err.to_string(), "model not found: ARIMA_Tuned");
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = PipelineError::FitRequired;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PipelineError = io.into();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
