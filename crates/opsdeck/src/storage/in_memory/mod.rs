//! In-memory storage backend with optional JSONL persistence.
//!
//! All documents live in a `HashMap` keyed by [`crate::domain::DocKey`],
//! wrapped in `Arc<tokio::sync::Mutex<_>>` so the boxed trait object is
//! safe to share across async tasks. Persistence is layered on by the
//! factory in the parent module: `load_from_jsonl` rebuilds the map from
//! disk, `save_to_jsonl` rewrites the collection file atomically.
//!
//! Operations hold the lock for the duration of one trait call, which
//! matches the subsystem's concurrency model: one full-collection read,
//! then zero or one batched write, nothing long-lived.

mod inner;
mod jsonl;
mod trait_impl;

use crate::storage::IssueStore;
use inner::InMemoryStoreInner;
use std::sync::Arc;
use tokio::sync::Mutex;

// Re-export public API
pub use jsonl::{LoadWarning, load_from_jsonl, save_to_jsonl};

/// Thread-safe in-memory store.
pub(crate) type InMemoryStore = Arc<Mutex<InMemoryStoreInner>>;

/// Create a new, empty in-memory store.
pub fn new_in_memory_store() -> Box<dyn IssueStore> {
    Box::new(Arc::new(Mutex::new(InMemoryStoreInner::new())))
}
