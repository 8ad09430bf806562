//! The identity service: scan, plan, one atomic batch, audit.
//!
//! Every corrective operation follows the same shape. A full-collection
//! read, a pure planning step, a single batched write, and one audit
//! record. The read and the write are not transactionally isolated from
//! other writers; a creation landing between them can introduce a new
//! collision, which the next repair run picks up. The subsystem provides
//! eventual uniqueness and is safe to re-run from scratch at any time.

use super::allocator::{DisplayIdSequence, next_display_id, next_for_app};
use super::backfill::plan_backfill;
use super::import::{ImportRow, row_into_issue, validate_rows};
use super::repair::plan_repair;
use crate::audit::{AuditEvent, AuditSink};
use crate::auth::{Caller, require_admin};
use crate::doc_key::DocKeyGenerator;
use crate::domain::{AppKey, Issue, NewIssue};
use crate::error::{Error, Result};
use crate::storage::{BatchWrite, IssueStore, MAX_BATCH_WRITES};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;

/// Result of one repair invocation.
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// Number of records that received a fresh identifier.
    pub fixed: usize,

    /// Audit log line per reassignment, or a single no-op line.
    pub log: Vec<String>,
}

/// Result of one bulk import invocation.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Number of rows committed.
    pub imported: usize,

    /// Display identifiers assigned, in input row order.
    pub display_ids: Vec<String>,
}

/// Orchestrates identifier allocation, backfill, repair, and bulk import
/// against a store and an audit sink.
pub struct IdentityService<'a> {
    store: &'a mut dyn IssueStore,
    audit: &'a dyn AuditSink,
}

impl<'a> IdentityService<'a> {
    /// Create a service over the given store and audit sink.
    pub fn new(store: &'a mut dyn IssueStore, audit: &'a dyn AuditSink) -> Self {
        Self { store, audit }
    }

    /// Compute the next unused display identifier for an app key.
    ///
    /// Pure read: the caller is responsible for writing the returned
    /// value exactly once. Inherently race-prone by design; collisions
    /// are repaired, not prevented.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for an unregistered app key,
    /// before any scan occurs.
    pub async fn allocate(&self, app_key: &str) -> Result<String> {
        let issues = self.store.scan_all().await?;
        next_display_id(&issues, app_key)
    }

    /// Create an issue, allocating its display identifier synchronously.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` when creation data fails
    /// validation.
    pub async fn create_issue(&mut self, caller: &Caller, mut new_issue: NewIssue) -> Result<Issue> {
        new_issue.validate().map_err(Error::InvalidArgument)?;

        if new_issue.display_id.is_none() {
            let issues = self.store.scan_all().await?;
            new_issue.display_id = Some(next_for_app(&issues, new_issue.app));
        }

        let issue = self.store.create(new_issue).await?;

        self.audit
            .record(AuditEvent::now(
                caller.actor.clone(),
                "issue.create",
                vec![target_label(&issue)],
                None,
                Some(json!({
                    "display_id": issue.display_id,
                    "severity": issue.severity,
                    "title": issue.title,
                })),
            ))
            .await?;

        Ok(issue)
    }

    /// Assign identifiers to every record that has none.
    ///
    /// Returns the number of records fixed; zero means no writes were
    /// performed at all.
    ///
    /// # Errors
    ///
    /// Returns `Error::PermissionDenied` for non-admin callers before any
    /// read occurs, and surfaces store failures unmodified (the batch is
    /// all-or-nothing).
    pub async fn assign_missing(&mut self, caller: &Caller) -> Result<usize> {
        require_admin(caller, "assign missing identifiers")?;

        let issues = self.store.scan_all().await?;
        let plan = plan_backfill(&issues);
        if plan.is_empty() {
            info!("backfill: every record already carries an identifier");
            return Ok(0);
        }

        let targets: Vec<String> = plan.iter().map(|a| a.display_id.clone()).collect();
        let before = Value::Object(
            plan.iter()
                .map(|a| (a.key.to_string(), json!({ "display_id": null })))
                .collect(),
        );
        let after = Value::Object(
            plan.iter()
                .map(|a| (a.key.to_string(), json!({ "display_id": a.display_id })))
                .collect(),
        );

        let batch: Vec<BatchWrite> = plan
            .iter()
            .map(|a| BatchWrite::SetDisplayId {
                key: a.key.clone(),
                display_id: a.display_id.clone(),
            })
            .collect();

        let fixed = self.store.apply_batch(batch).await?;
        info!(fixed, "backfill assigned identifiers");

        self.audit
            .record(AuditEvent::now(
                caller.actor.clone(),
                "identity.assign_missing",
                targets,
                Some(before),
                Some(after),
            ))
            .await?;

        Ok(fixed)
    }

    /// Repair display identifier collisions.
    ///
    /// The earliest-created member of each colliding group keeps its
    /// identifier; every later member is reassigned in one atomic batch.
    /// Idempotent: a clean collection reports `fixed: 0` and performs no
    /// writes.
    ///
    /// # Errors
    ///
    /// - `Error::PermissionDenied` for non-admin callers, before any read
    /// - `Error::PreconditionFailed` when the plan exceeds the batch
    ///   ceiling; nothing is written and manual chunking is required
    pub async fn repair_duplicates(&mut self, caller: &Caller) -> Result<RepairOutcome> {
        require_admin(caller, "repair duplicate identifiers")?;

        let issues = self.store.scan_all().await?;
        let plan = plan_repair(&issues);
        if plan.reassignments.is_empty() {
            info!("repair: no duplicate identifiers found");
            return Ok(RepairOutcome {
                fixed: 0,
                log: plan.log,
            });
        }

        if plan.reassignments.len() > MAX_BATCH_WRITES {
            return Err(Error::PreconditionFailed(format!(
                "repair requires {} reassignments, exceeding the batch ceiling of \
                 {MAX_BATCH_WRITES}; no writes performed",
                plan.reassignments.len()
            )));
        }

        let targets: Vec<String> = plan
            .reassignments
            .iter()
            .map(|r| r.new_display_id.clone())
            .collect();
        let before = Value::Object(
            plan.reassignments
                .iter()
                .map(|r| (r.key.to_string(), json!({ "display_id": r.old_display_id })))
                .collect(),
        );
        let after = Value::Object(
            plan.reassignments
                .iter()
                .map(|r| (r.key.to_string(), json!({ "display_id": r.new_display_id })))
                .collect(),
        );

        let batch: Vec<BatchWrite> = plan
            .reassignments
            .iter()
            .map(|r| BatchWrite::SetDisplayId {
                key: r.key.clone(),
                display_id: r.new_display_id.clone(),
            })
            .collect();

        let fixed = self.store.apply_batch(batch).await?;
        info!(fixed, "repair reassigned colliding identifiers");

        self.audit
            .record(AuditEvent::now(
                caller.actor.clone(),
                "identity.repair_duplicates",
                targets,
                Some(before),
                Some(after),
            ))
            .await?;

        Ok(RepairOutcome {
            fixed,
            log: plan.log,
        })
    }

    /// Import a batch of rows as fully-formed issues.
    ///
    /// The allocator is seeded once before the batch, so rows receive
    /// consecutive identifiers in input order; all rows commit in one
    /// atomic batch or not at all.
    ///
    /// # Errors
    ///
    /// - `Error::PermissionDenied` for non-admin callers
    /// - `Error::InvalidArgument` for an unregistered app key, an empty
    ///   batch, or a row with an invalid title
    /// - `Error::PreconditionFailed` when the batch exceeds the ceiling
    pub async fn bulk_import(
        &mut self,
        caller: &Caller,
        app_key: &str,
        rows: Vec<ImportRow>,
    ) -> Result<ImportOutcome> {
        require_admin(caller, "bulk import issues")?;

        let app = AppKey::from_key(app_key).ok_or_else(|| {
            Error::InvalidArgument(format!("unknown app key '{app_key}'"))
        })?;
        validate_rows(&rows)?;

        let issues = self.store.scan_all().await?;
        let mut sequence = DisplayIdSequence::seeded(&issues, app);
        let mut keys = DocKeyGenerator::with_existing(issues.iter().map(|issue| &issue.id));
        let now = Utc::now();

        let mut batch = Vec::with_capacity(rows.len());
        let mut display_ids = Vec::with_capacity(rows.len());
        for row in rows {
            let key = keys
                .generate(app.key(), &row.title)
                .map_err(|e| Error::Internal(format!("document key generation failed: {e}")))?;
            let display_id = sequence.next_id();
            display_ids.push(display_id.clone());
            batch.push(BatchWrite::Insert(row_into_issue(
                row, app, key, display_id, now,
            )));
        }

        let imported = self.store.apply_batch(batch).await?;
        info!(imported, app = app.key(), "bulk import committed");

        self.audit
            .record(AuditEvent::now(
                caller.actor.clone(),
                "identity.bulk_import",
                display_ids.clone(),
                None,
                Some(json!({ "imported": imported, "app": app.key() })),
            ))
            .await?;

        Ok(ImportOutcome {
            imported,
            display_ids,
        })
    }
}

fn target_label(issue: &Issue) -> String {
    issue
        .display_id
        .clone()
        .unwrap_or_else(|| issue.id.to_string())
}
