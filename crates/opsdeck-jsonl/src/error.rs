//! Error types for opsdeck-jsonl operations.

use std::io;
use thiserror::Error;

/// The error type for JSONL file operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error on the write path.
    ///
    /// Read-path parse failures are reported as [`crate::Warning`]s rather
    /// than errors, so this variant only surfaces from writers.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for opsdeck-jsonl operations.
pub type Result<T> = std::result::Result<T, Error>;
