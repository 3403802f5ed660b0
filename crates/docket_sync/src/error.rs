//! Error types for the mutation pipeline.

use docket_core::{EntityId, Status, Version};
use thiserror::Error;

/// Result type for mutation operations.
pub type MutationResult<T> = Result<T, MutationError>;

/// Errors that can occur while mutating entities.
#[derive(Debug, Error)]
pub enum MutationError {
    /// The requested status change is not a legal transition.
    ///
    /// Fully determined client-side; no network call was made and the
    /// record store was not touched.
    #[error("illegal transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: Status,
        /// Requested status.
        to: Status,
    },

    /// The server holds a newer version than the mutation was based on.
    ///
    /// The entity was restored to its pre-optimistic snapshot. The caller
    /// decides whether to refetch-and-retry or surface the conflict.
    #[error("version conflict on {entity_id}: base {base_version}, server has {server_version}")]
    VersionConflict {
        /// The entity that conflicted.
        entity_id: EntityId,
        /// The version the mutation was based on.
        base_version: Version,
        /// The version the server reported.
        server_version: Version,
    },

    /// Network or server failure.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The entity was absent from the record store at mutation time.
    #[error("entity not found: {entity_id}")]
    NotFound {
        /// The missing entity.
        entity_id: EntityId,
    },

    /// The server answered with a payload this client cannot interpret.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl MutationError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if retrying the operation may succeed.
    ///
    /// A version conflict is not retryable as-is: the caller must refetch
    /// and rebase first.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MutationError::Transport {
                retryable: true,
                ..
            }
        )
    }
}
