//! Resilient JSONL reading.
//!
//! The document files opsdeck reads are touched by multiple writers over
//! their lifetime, so a torn or hand-edited line is an expected condition,
//! not a fatal one. The reader parses what it can and reports the rest.

use crate::error::Result;
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// A non-fatal problem encountered while reading a JSONL file.
///
/// Warnings never abort the read; the affected line is skipped and parsing
/// continues. Callers should log them, since they indicate data-quality
/// problems that may need manual attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A non-empty line that failed to parse as the expected record type.
    MalformedLine {
        /// 1-based line number within the file.
        line_number: usize,
        /// Description of the parse failure.
        error: String,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::MalformedLine { line_number, error } => {
                write!(f, "malformed line {line_number}: {error}")
            }
        }
    }
}

/// Read every parsable record from a JSONL file.
///
/// Empty and whitespace-only lines are ignored. Lines that fail to parse as
/// `T` are skipped and reported as [`Warning::MalformedLine`]. A missing
/// file is treated as an empty collection.
///
/// # Errors
///
/// Returns an error only for IO failures; parse failures are warnings.
pub async fn read_jsonl_resilient<T>(path: &Path) -> Result<(Vec<T>, Vec<Warning>)>
where
    T: DeserializeOwned,
{
    if !path.exists() {
        return Ok((Vec::new(), Vec::new()));
    }

    let file = File::open(path).await?;
    let mut lines = BufReader::new(file).lines();

    let mut records = Vec::new();
    let mut warnings = Vec::new();
    let mut line_number = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<T>(trimmed) {
            Ok(record) => records.push(record),
            Err(error) => warnings.push(Warning::MalformedLine {
                line_number,
                error: error.to_string(),
            }),
        }
    }

    Ok((records, warnings))
}
