//! Error types for Polyrun
//!
//! These cover failures *inside* the engine (bad config, I/O on the workspace,
//! a spawn that failed for reasons other than a missing toolchain). Failures of
//! the submitted code itself are never errors; they are reported through
//! [`crate::result::ExecutionOutcome`].

use thiserror::Error;

/// Result type alias using Polyrun's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Polyrun
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workspace creation or materialization error
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// A child process could not be started
    #[error("Spawn error: {0}")]
    Spawn(String),

    /// The program to spawn is not installed
    #[error("Toolchain not found: {0}")]
    ToolchainNotFound(String),

    /// Embedded interpreter error
    #[error("Sandbox error: {0}")]
    Sandbox(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if error is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

impl From<rquickjs::Error> for Error {
    fn from(err: rquickjs::Error) -> Self {
        Error::Sandbox(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            Error::Internal(format!("task panicked: {}", err))
        } else {
            Error::Internal(format!("task cancelled: {}", err))
        }
    }
}
