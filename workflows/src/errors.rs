//! Error types for the workflow core

use thiserror::Error;

/// Main error type for workflow operations
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Storage quota exceeded: {needed} bytes needed, {quota} bytes available")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl WorkflowError {
    /// Whether the error came from the durable store rather than the caller's input
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            WorkflowError::IoError(_)
                | WorkflowError::JsonError(_)
                | WorkflowError::StorageError(_)
                | WorkflowError::QuotaExceeded { .. }
        )
    }
}
