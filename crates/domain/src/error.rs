//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`PresenceError`] via `#[from]` at port boundaries.

/// Top-level error crossing port boundaries.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The upstream API call did not succeed (non-2xx, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent or empty.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A wall-clock time is not in `HH:MM` format.
    #[error("invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),
}
