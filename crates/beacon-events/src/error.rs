//! Event crate error types.

use thiserror::Error;

/// Event crate error type.
#[derive(Error, Debug)]
pub enum EventsError {
    /// IO error reading or writing the player identity file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Player identity file holds something other than a UUID
    #[error("Invalid player id in {path}: {reason}")]
    InvalidIdentity { path: String, reason: String },
}

/// Result type alias using EventsError.
pub type EventsResult<T> = Result<T, EventsError>;
