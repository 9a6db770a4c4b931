//! Error types for the OpenCGA client.
//!
//! # Design
//! Every failure is terminal for the operation that produced it. Variants
//! carry the REST path (and, for result-count failures, the observed count)
//! so callers can report the problem without re-running the call.
//! `NotFound` and `Ambiguous` are both server-side result-count failures;
//! they get their own variants because callers routinely branch on them.

use thiserror::Error;

/// Errors returned by `OpencgaClient` and the resource operations.
#[derive(Debug, Error)]
pub enum OpencgaError {
    /// The HTTP round-trip itself failed (connection, I/O, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The body was not valid JSON or did not have the envelope shape.
    #[error("failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    /// The server reported an error, either at envelope level or inside the
    /// single response, or the envelope held the wrong number of responses.
    #[error("API error on {path}: {message}")]
    Api { path: String, message: String },

    /// A lookup that requires exactly one result returned none.
    #[error("{entity} not found at {path}")]
    NotFound { path: String, entity: String },

    /// A lookup that requires exactly one result returned several.
    #[error("ambiguous result for {entity} at {path}: expected 1 result, got {count}")]
    Ambiguous {
        path: String,
        entity: String,
        count: usize,
    },

    /// A result record did not decode into the expected entity.
    #[error("unexpected {entity} shape: {message}")]
    Shape { entity: String, message: String },

    /// Login was rejected.
    #[error("login failed for user {user}: {message}")]
    Auth { user: String, message: String },

    /// A caller-supplied parameter violates a precondition. Raised before any
    /// HTTP call is made.
    #[error("validation error: {0}")]
    Validation(String),

    /// A request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl OpencgaError {
    /// True for the result-count failures (`NotFound`, `Ambiguous`) and
    /// server-reported errors.
    pub fn is_api_error(&self) -> bool {
        matches!(
            self,
            Self::Api { .. } | Self::NotFound { .. } | Self::Ambiguous { .. }
        )
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, OpencgaError>;
