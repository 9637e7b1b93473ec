//! Error types for the remote executor

use thiserror::Error;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the remote executor
///
/// Messages are returned to the caller verbatim, so the `Display` output of
/// each variant is part of the wire contract.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller token missing or wrong
    #[error("Forbidden")]
    Forbidden,

    /// Missing or unrecognized action
    #[error("{0}")]
    BadRequest(String),

    /// Resolved path escapes the sandbox root
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Action switched off by configuration
    #[error("Action disabled: {0}")]
    ActionDisabled(String),

    /// Process spawn/wait error
    #[error("Process error: {0}")]
    Process(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Malformed request input
    #[error("{0}")]
    InvalidInput(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status code this error surfaces as
    ///
    /// Only caller-correctable failures get a distinct status; a sandbox
    /// escape is reported like any other internal failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Forbidden => 403,
            Error::BadRequest(_) | Error::InvalidInput(_) => 400,
            _ => 500,
        }
    }

    /// Check if error is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Forbidden | Error::BadRequest(_) | Error::InvalidInput(_)
        )
    }
}
