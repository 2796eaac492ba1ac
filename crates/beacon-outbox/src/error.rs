//! Outbox error types.

use thiserror::Error;

/// Outbox error type.
#[derive(Error, Debug)]
pub enum OutboxError {
    /// IO error (snapshot files, key-value directory)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Transport reported a failed delivery
    #[error("Send failed: {0}")]
    Send(String),

    /// Store rejected an operation
    #[error("Store error: {0}")]
    Store(String),

    /// Snapshot does not fit in the key-value quota
    #[error("Snapshot of {size} bytes exceeds quota of {quota} bytes")]
    QuotaExceeded { size: usize, quota: usize },

    /// Another live logger already owns this store
    #[error("A telemetry logger is already running for {0}")]
    AlreadyRunning(String),

    /// Logger constructed outside a Tokio runtime
    #[error("No Tokio runtime available to drive the sender")]
    NoRuntime,
}

/// Result type alias using OutboxError.
pub type OutboxResult<T> = Result<T, OutboxError>;
