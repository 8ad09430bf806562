//! Core in-memory storage data structures.

use crate::doc_key::DocKeyGenerator;
use crate::domain::{DocKey, Issue, NewIssue};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Inner storage structure (not thread-safe on its own).
///
/// Wrapped in `Arc<Mutex<>>` by the module factory. Holds the document
/// map and the key generator seeded with every key currently present.
pub(crate) struct InMemoryStoreInner {
    /// Documents indexed by key for O(1) lookups.
    pub(super) issues: HashMap<DocKey, Issue>,

    /// Key generator for newly created documents.
    pub(super) keys: DocKeyGenerator,
}

impl InMemoryStoreInner {
    /// Create a new empty store.
    pub(crate) fn new() -> Self {
        Self {
            issues: HashMap::new(),
            keys: DocKeyGenerator::new(),
        }
    }

    /// Generate a fresh document key for a new issue.
    pub(super) fn generate_key(&mut self, new_issue: &NewIssue) -> Result<DocKey> {
        self.keys
            .generate(new_issue.app.key(), &new_issue.title)
            .map_err(|e| Error::Internal(format!("document key generation failed: {e}")))
    }
}
