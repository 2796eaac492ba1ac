//! Core error types shared by beacon crates.

use thiserror::Error;

/// Error raised while loading configuration or resolving paths.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Config value out of range, or logging set up twice
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading or writing the config file or log file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Collector URL does not parse
    #[error("Invalid collector URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Config file is not valid JSON for `Config`
    #[error("Malformed config file: {0}")]
    Json(#[from] serde_json::Error),

    /// No home directory to place `~/.beacon` under; pass a base dir instead
    #[error("Could not determine home directory")]
    NoHomeDir,
}

/// Result type alias using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
