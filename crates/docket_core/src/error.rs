//! Error types for Docket core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Docket core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A criterion or field value failed its shape check.
    #[error("invalid {field}: {message}")]
    Validation {
        /// The field the message is scoped to.
        field: String,
        /// Description of the problem.
        message: String,
    },

    /// A status value is not part of the configured workflow.
    #[error("unknown status: {status}")]
    UnknownStatus {
        /// The status that was not found in the workflow config.
        status: String,
    },

    /// Preference blob could not be read or written.
    #[error("preferences error: {message}")]
    Preferences {
        /// Description of the failure.
        message: String,
    },

    /// I/O error from the file-backed preference store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encode/decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Creates a field-scoped validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown-status error.
    pub fn unknown_status(status: impl Into<String>) -> Self {
        Self::UnknownStatus {
            status: status.into(),
        }
    }

    /// Creates a preference store error.
    pub fn preferences(message: impl Into<String>) -> Self {
        Self::Preferences {
            message: message.into(),
        }
    }
}
