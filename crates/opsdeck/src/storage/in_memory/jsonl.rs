//! JSONL persistence for the in-memory store.

use super::inner::InMemoryStoreInner;
use crate::domain::{DocKey, Issue};
use crate::error::Result;
use crate::storage::IssueStore;
use opsdeck_jsonl::{Warning as JsonlWarning, read_jsonl_resilient, write_jsonl_atomic};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Non-fatal problems encountered while loading the collection file.
///
/// Loading continues past each of these; the affected line or record is
/// skipped or superseded. Applications should log them, since they signal
/// data-quality issues in a file several writers have touched.
#[derive(Debug, Clone)]
pub enum LoadWarning {
    /// A line that failed to parse as an issue document.
    MalformedLine {
        /// 1-based line number within the file.
        line_number: usize,
        /// Description of the parse failure.
        error: String,
    },

    /// Two lines carried the same document key.
    ///
    /// The later line wins, matching last-write semantics of a
    /// multi-writer file.
    DuplicateKey {
        /// The key that appeared more than once.
        key: DocKey,
    },
}

/// Load a store from a JSONL collection file.
///
/// Malformed lines are skipped with a warning; duplicate document keys
/// resolve last-write-wins with a warning. A missing file yields an empty
/// store.
///
/// # Errors
///
/// Returns an error only for IO failures.
pub async fn load_from_jsonl(path: &Path) -> Result<(Box<dyn IssueStore>, Vec<LoadWarning>)> {
    let (records, jsonl_warnings) = read_jsonl_resilient::<Issue>(path).await?;

    let mut warnings: Vec<LoadWarning> = jsonl_warnings
        .into_iter()
        .map(|w| match w {
            JsonlWarning::MalformedLine { line_number, error } => {
                LoadWarning::MalformedLine { line_number, error }
            }
        })
        .collect();

    let mut inner = InMemoryStoreInner::new();
    for issue in records {
        inner.keys.register(&issue.id);
        if inner.issues.insert(issue.id.clone(), issue.clone()).is_some() {
            warnings.push(LoadWarning::DuplicateKey { key: issue.id });
        }
    }

    Ok((Box::new(Arc::new(Mutex::new(inner))), warnings))
}

/// Save a store to a JSONL collection file with an atomic rewrite.
///
/// Records are serialized in creation order (key as tiebreaker) so
/// repeated saves of the same state produce byte-identical files.
///
/// # Errors
///
/// Returns an error if the export or the atomic write fails.
pub async fn save_to_jsonl(store: &dyn IssueStore, path: &Path) -> Result<()> {
    let mut issues = store.scan_all().await?;
    issues.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    write_jsonl_atomic(path, &issues).await?;
    Ok(())
}
