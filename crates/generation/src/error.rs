//! Error types for the generation layer.

use reelboard_core::transition::TransitionStatus;
use reelboard_core::types::TransitionId;

/// Errors from a generation or image service call.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Generation API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response whose body lacked a required field.
    #[error("Invalid response from generation API: {0}")]
    InvalidResponse(String),
}

/// Errors surfaced to callers of the transition coordinator.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Rejected before any network call; nothing was mutated.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transition {0} not found")]
    NotFound(TransitionId),

    /// The transition is in a status that does not accept a new job.
    #[error("Transition {id} cannot be submitted while {status}")]
    NotSubmittable {
        id: TransitionId,
        status: TransitionStatus,
    },

    /// The submit call failed; the transition has been marked failed.
    #[error("Failed to submit transition: {0}")]
    Submission(#[source] ServiceError),

    /// The transition vanished or was changed while the submit call was
    /// outstanding, so the response was discarded.
    #[error("Generation for transition {0} was cancelled")]
    Cancelled(TransitionId),
}

/// Malformed configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}
