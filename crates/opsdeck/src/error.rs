//! Error types for opsdeck operations.

use crate::domain::DocKey;
use std::io;
use thiserror::Error;

/// The error type for opsdeck operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller does not hold the role an operation requires.
    #[error("permission denied: '{actor}' must be an admin to {action}")]
    PermissionDenied {
        /// The caller that was rejected.
        actor: String,
        /// The operation that was attempted.
        action: &'static str,
    },

    /// A caller-supplied value is outside the accepted domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The targeted issue does not exist.
    #[error("issue not found: {0}")]
    IssueNotFound(DocKey),

    /// An operation's precondition does not hold (e.g. batch ceiling).
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected store failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<opsdeck_jsonl::Error> for Error {
    fn from(e: opsdeck_jsonl::Error) -> Self {
        match e {
            opsdeck_jsonl::Error::Io(io_err) => Error::Io(io_err),
            opsdeck_jsonl::Error::Json(json_err) => Error::Json(json_err),
        }
    }
}

/// A specialized Result type for opsdeck operations.
pub type Result<T> = std::result::Result<T, Error>;
