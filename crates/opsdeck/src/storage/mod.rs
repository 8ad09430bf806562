//! Storage abstraction for the issue collection.
//!
//! The issue collection is the only shared mutable resource in the
//! subsystem, and this module is where its access pattern is pinned down:
//!
//! - [`IssueStore::scan_all`] is the deliberately unfiltered, unordered,
//!   unlimited full-collection read that the allocator, repairer, and
//!   backfill pass depend on. An ordering or limit clause there could
//!   exclude older, high-numbered, or field-missing records and silently
//!   mint a duplicate identifier.
//! - [`IssueStore::list`] is the ordinary read path (UI lists, filters),
//!   which is ordered and limited.
//! - [`IssueStore::apply_batch`] is the single atomic multi-record write
//!   each corrective invocation performs. No record is mutated outside a
//!   batch, and a batch never exceeds [`MAX_BATCH_WRITES`].
//!
//! The backing implementation is an in-memory map with JSONL file
//! persistence layered on top, which is all an eventually-consistent,
//! multi-writer document file needs locally: writers rewrite atomically,
//! readers parse resiliently.

use crate::domain::{DocKey, Issue, IssueFilter, NewIssue, Note, UpdatePatch};
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

// Storage backend implementations
pub mod in_memory;

/// Ceiling on writes per atomic batch.
///
/// A corrective pass that needs more writes than this aborts with
/// `PreconditionFailed` and performs nothing, signalling that manual or
/// chunked intervention is required rather than a partial repair.
pub const MAX_BATCH_WRITES: usize = 500;

/// One write inside an atomic batch.
#[derive(Debug, Clone)]
pub enum BatchWrite {
    /// Insert a fully-formed issue document (bulk import path).
    Insert(Issue),

    /// Assign or reassign a display identifier (backfill and repair paths).
    SetDisplayId {
        /// Document key of the target record.
        key: DocKey,
        /// The identifier to write.
        display_id: String,
    },
}

/// Core storage trait for the issue collection.
///
/// Implementations must be `Send + Sync`; the trait is object-safe and is
/// consumed as `Box<dyn IssueStore>`.
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Create a new issue.
    ///
    /// Assigns a document key and creation timestamps. The display
    /// identifier is whatever the caller computed: the identity service
    /// allocates one at creation time, while a path that skipped
    /// allocation passes `None` and leaves the record for backfill.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` when the title fails validation.
    async fn create(&mut self, new_issue: NewIssue) -> Result<Issue>;

    /// Get an issue by document key. Returns `None` if absent.
    async fn get(&self, key: &DocKey) -> Result<Option<Issue>>;

    /// Read the full collection: every record, soft-deleted included, with
    /// no ordering, filtering, or limit.
    async fn scan_all(&self) -> Result<Vec<Issue>>;

    /// List live issues matching the filter, newest first, limited.
    ///
    /// Soft-deleted records are always excluded here; only
    /// [`IssueStore::scan_all`] sees them.
    async fn list(&self, filter: &IssueFilter) -> Result<Vec<Issue>>;

    /// Apply an ordinary update.
    ///
    /// Identifier fields carried by the patch (`display_id` and its legacy
    /// spellings) are stripped before anything is applied: an assigned
    /// display identifier is write-once.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if the issue doesn't exist.
    async fn update(&mut self, key: &DocKey, patch: UpdatePatch) -> Result<Issue>;

    /// Append an annotation to an issue's note list.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if the issue doesn't exist.
    async fn add_note(&mut self, key: &DocKey, note: Note) -> Result<Issue>;

    /// Apply a batch of writes atomically: every write is validated before
    /// any mutation happens, so the batch succeeds whole or not at all.
    ///
    /// Returns the number of writes applied.
    ///
    /// # Errors
    ///
    /// - `Error::PreconditionFailed` if the batch exceeds [`MAX_BATCH_WRITES`]
    /// - `Error::IssueNotFound` if a `SetDisplayId` targets a missing record
    /// - `Error::InvalidArgument` if an `Insert` reuses an existing key
    async fn apply_batch(&mut self, batch: Vec<BatchWrite>) -> Result<usize>;

    /// Save changes to persistent storage.
    ///
    /// Takes `&self`; implementations use interior mutability so saving is
    /// possible after read-only operations.
    async fn save(&self) -> Result<()>;

    /// Reload state from persistent storage, discarding in-memory changes.
    async fn reload(&mut self) -> Result<()>;
}

/// Storage backend configuration.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// In-memory storage (ephemeral).
    InMemory,

    /// JSONL file storage (persistent).
    Jsonl(PathBuf),
}

/// Wrapper that adds JSONL file persistence to the in-memory backend.
///
/// `save()` rewrites the collection file atomically; `reload()` rebuilds
/// the in-memory state from disk.
struct JsonlBackedStore {
    inner: Box<dyn IssueStore>,
    path: PathBuf,
}

#[async_trait]
impl IssueStore for JsonlBackedStore {
    async fn create(&mut self, new_issue: NewIssue) -> Result<Issue> {
        self.inner.create(new_issue).await
    }

    async fn get(&self, key: &DocKey) -> Result<Option<Issue>> {
        self.inner.get(key).await
    }

    async fn scan_all(&self) -> Result<Vec<Issue>> {
        self.inner.scan_all().await
    }

    async fn list(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        self.inner.list(filter).await
    }

    async fn update(&mut self, key: &DocKey, patch: UpdatePatch) -> Result<Issue> {
        self.inner.update(key, patch).await
    }

    async fn add_note(&mut self, key: &DocKey, note: Note) -> Result<Issue> {
        self.inner.add_note(key, note).await
    }

    async fn apply_batch(&mut self, batch: Vec<BatchWrite>) -> Result<usize> {
        self.inner.apply_batch(batch).await
    }

    async fn save(&self) -> Result<()> {
        in_memory::save_to_jsonl(self.inner.as_ref(), &self.path).await
    }

    async fn reload(&mut self) -> Result<()> {
        if self.path.exists() {
            let (store, warnings) = in_memory::load_from_jsonl(&self.path).await?;
            for warning in &warnings {
                tracing::warn!(warning = ?warning, "issue collection reload warning");
            }
            self.inner = store;
        } else {
            self.inner = in_memory::new_in_memory_store();
        }
        Ok(())
    }
}

/// Create a storage instance for the given backend.
///
/// # Errors
///
/// Returns `Error::Io` if the backing file exists but cannot be read.
pub async fn create_store(backend: StorageBackend) -> Result<Box<dyn IssueStore>> {
    match backend {
        StorageBackend::InMemory => Ok(in_memory::new_in_memory_store()),
        StorageBackend::Jsonl(path) => {
            let inner = if path.exists() {
                let (store, warnings) = in_memory::load_from_jsonl(&path).await?;
                for warning in &warnings {
                    // Log and continue; the collection is still usable
                    tracing::warn!(warning = ?warning, "issue collection load warning");
                }
                store
            } else {
                in_memory::new_in_memory_store()
            };
            Ok(Box::new(JsonlBackedStore { inner, path }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppKey, IssueCategory, Severity};
    use tempfile::TempDir;

    fn new_issue(title: &str) -> NewIssue {
        NewIssue {
            app: AppKey::EdCore,
            title: title.to_string(),
            description: "test".to_string(),
            severity: Severity::S2,
            category: IssueCategory::UxFlow,
            reporter: None,
            display_id: None,
        }
    }

    #[tokio::test]
    async fn jsonl_store_round_trips_through_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("issues.jsonl");

        let mut store = create_store(StorageBackend::Jsonl(path.clone())).await.unwrap();
        let created = store.create(new_issue("Persisted issue")).await.unwrap();
        store.save().await.unwrap();

        // Unsaved in-memory change is discarded by reload
        let patch = UpdatePatch {
            title: Some("Changed in memory".to_string()),
            ..UpdatePatch::default()
        };
        store.update(&created.id, patch).await.unwrap();
        store.reload().await.unwrap();

        let reloaded = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(reloaded.title, "Persisted issue");
    }

    #[tokio::test]
    async fn reload_with_missing_file_resets_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("issues.jsonl");

        let mut store = create_store(StorageBackend::Jsonl(path.clone())).await.unwrap();
        let created = store.create(new_issue("Ephemeral")).await.unwrap();
        store.save().await.unwrap();

        std::fs::remove_file(&path).unwrap();
        store.reload().await.unwrap();

        assert!(store.get(&created.id).await.unwrap().is_none());
    }
}
