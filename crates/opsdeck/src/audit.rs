//! Structured audit trail for identity mutations.
//!
//! Every mutating invocation of the identity subsystem appends exactly one
//! structured record: who acted, what they did, which records were touched,
//! and a before/after snapshot of the fields that changed. Classification
//! is read-only and never audits.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// One audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Who performed the mutation.
    pub actor: String,

    /// Action name (e.g. `identity.repair_duplicates`).
    pub action: String,

    /// Display identifiers or document keys of the touched records.
    pub targets: Vec<String>,

    /// Field snapshot before the mutation, keyed by target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,

    /// Field snapshot after the mutation, keyed by target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,

    /// When the mutation was committed.
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    /// Build an event stamped with the current time.
    pub fn now(
        actor: impl Into<String>,
        action: impl Into<String>,
        targets: Vec<String>,
        before: Option<Value>,
        after: Option<Value>,
    ) -> Self {
        Self {
            actor: actor.into(),
            action: action.into(),
            targets,
            before,
            after,
            at: Utc::now(),
        }
    }
}

/// Sink that audit records are appended to.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one record. Failures surface to the caller; the mutation has
    /// already been committed when this runs, so callers log rather than
    /// roll back.
    async fn record(&self, event: AuditEvent) -> Result<()>;
}

/// Audit sink backed by an append-only JSONL file.
pub struct JsonlAuditSink {
    path: PathBuf,
}

impl JsonlAuditSink {
    /// Create a sink appending to the given file.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<()> {
        opsdeck_jsonl::append_jsonl(&self.path, &event).await?;
        Ok(())
    }
}

/// In-memory audit sink for tests.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: tokio::sync::Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the recorded events.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}
