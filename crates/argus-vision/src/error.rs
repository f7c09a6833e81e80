//! Error types for vision operations.

use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur during model loading or inference.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("detection model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl VisionError {
    /// Create a model-unavailable error.
    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable(message.into())
    }

    /// Create an inference failure error.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
