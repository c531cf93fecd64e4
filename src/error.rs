//! Error types for the Kolosal transformers

use thiserror::Error;

/// Result type alias for Kolosal operations
pub type Result<T> = std::result::Result<T, KolosalError>;

/// Main error type for the transformers
#[derive(Error, Debug)]
pub enum KolosalError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for KolosalError {
    fn from(err: serde_json::Error) -> Self {
        KolosalError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for KolosalError {
    fn from(err: ndarray::ShapeError) -> Self {
        KolosalError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
