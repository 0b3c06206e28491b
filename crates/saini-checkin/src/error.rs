//! Check-in error types.

use thiserror::Error;

/// Errors from the check-in flow.
#[derive(Debug, Error)]
pub enum CheckinError {
    /// Bad or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Reply generation failed.
    #[error("Reply error: {0}")]
    Reply(String),

    /// Reply service returned an error status.
    #[error("Reply service error: {status} - {message}")]
    ReplyStatus { status: u16, message: String },

    /// Check-in history could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Semantic memory failure.
    #[error(transparent)]
    Memory(#[from] saini_memory::MemoryError),

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CheckinError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a reply error.
    pub fn reply(message: impl Into<String>) -> Self {
        Self::Reply(message.into())
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Whether a caller may reasonably retry the operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ReplyStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Network(_) | Self::Storage(_) | Self::Io(_) => true,
            Self::Memory(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<saini_core::ConfigError> for CheckinError {
    fn from(err: saini_core::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
