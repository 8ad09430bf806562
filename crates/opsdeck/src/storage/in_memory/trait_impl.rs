//! IssueStore trait implementation for in-memory storage.

use super::InMemoryStore;
use crate::domain::{self, DocKey, Issue, IssueFilter, NewIssue, Note, UpdatePatch, status};
use crate::error::{Error, Result};
use crate::storage::{BatchWrite, IssueStore, MAX_BATCH_WRITES};
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

#[async_trait]
impl IssueStore for InMemoryStore {
    async fn create(&mut self, new_issue: NewIssue) -> Result<Issue> {
        let mut inner = self.lock().await;

        new_issue.validate().map_err(Error::InvalidArgument)?;

        let id = inner.generate_key(&new_issue)?;
        let now = Utc::now();

        let issue = Issue {
            id: id.clone(),
            display_id: new_issue.display_id,
            app: new_issue.app,
            severity: new_issue.severity,
            status: status::DEFAULT.to_string(),
            category: new_issue.category,
            classification: None,
            deleted: false,
            title: new_issue.title,
            description: new_issue.description,
            reporter: new_issue.reporter,
            created_at: now,
            updated_at: now,
            notes: Vec::new(),
        };

        inner.issues.insert(id, issue.clone());
        Ok(issue)
    }

    async fn get(&self, key: &DocKey) -> Result<Option<Issue>> {
        let inner = self.lock().await;
        Ok(inner.issues.get(key).cloned())
    }

    async fn scan_all(&self) -> Result<Vec<Issue>> {
        let inner = self.lock().await;
        // Map iteration order is arbitrary, which is exactly the contract:
        // callers must not depend on any ordering from this read.
        Ok(inner.issues.values().cloned().collect())
    }

    async fn list(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let inner = self.lock().await;

        let mut issues: Vec<Issue> = inner
            .issues
            .values()
            .filter(|issue| {
                if issue.deleted {
                    return false;
                }
                if let Some(app) = filter.app {
                    if issue.app != app {
                        return false;
                    }
                }
                if let Some(severity) = filter.severity {
                    if issue.severity != severity {
                        return false;
                    }
                }
                if let Some(status) = &filter.status {
                    if &issue.status != status {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        // Newest first, key as the determinism tiebreaker
        issues.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        if let Some(limit) = filter.limit {
            issues.truncate(limit);
        }

        Ok(issues)
    }

    async fn update(&mut self, key: &DocKey, patch: UpdatePatch) -> Result<Issue> {
        let mut inner = self.lock().await;

        let issue = inner
            .issues
            .get_mut(key)
            .ok_or_else(|| Error::IssueNotFound(key.clone()))?;

        // Strip-on-update guard: an assigned display identifier is
        // write-once, whatever spelling the payload used.
        if patch.display_id.is_some() {
            debug!(key = %key, "stripped display identifier from update payload");
        }

        if let Some(title) = patch.title {
            domain::validate_title(&title).map_err(Error::InvalidArgument)?;
            issue.title = title;
        }
        if let Some(description) = patch.description {
            issue.description = description;
        }
        if let Some(severity) = patch.severity {
            issue.severity = severity;
        }
        if let Some(new_status) = patch.status {
            issue.status = new_status;
        }
        if let Some(category) = patch.category {
            issue.category = category;
        }
        if let Some(classification) = patch.classification {
            issue.classification = Some(classification);
        }
        if let Some(deleted) = patch.deleted {
            issue.deleted = deleted;
        }

        issue.updated_at = Utc::now();

        Ok(issue.clone())
    }

    async fn add_note(&mut self, key: &DocKey, note: Note) -> Result<Issue> {
        let mut inner = self.lock().await;

        let issue = inner
            .issues
            .get_mut(key)
            .ok_or_else(|| Error::IssueNotFound(key.clone()))?;

        issue.notes.push(note);
        issue.updated_at = Utc::now();

        Ok(issue.clone())
    }

    async fn apply_batch(&mut self, batch: Vec<BatchWrite>) -> Result<usize> {
        let mut inner = self.lock().await;

        if batch.len() > MAX_BATCH_WRITES {
            return Err(Error::PreconditionFailed(format!(
                "batch of {} writes exceeds the ceiling of {MAX_BATCH_WRITES}; \
                 chunked or manual intervention required",
                batch.len()
            )));
        }

        // Validation phase: no mutation happens until every write checks
        // out, which is what makes the batch all-or-nothing.
        for write in &batch {
            match write {
                BatchWrite::Insert(issue) => {
                    if inner.issues.contains_key(&issue.id) {
                        return Err(Error::InvalidArgument(format!(
                            "document key already exists: {}",
                            issue.id
                        )));
                    }
                }
                BatchWrite::SetDisplayId { key, .. } => {
                    if !inner.issues.contains_key(key) {
                        return Err(Error::IssueNotFound(key.clone()));
                    }
                }
            }
        }

        let count = batch.len();
        let now = Utc::now();
        for write in batch {
            match write {
                BatchWrite::Insert(issue) => {
                    inner.keys.register(&issue.id);
                    inner.issues.insert(issue.id.clone(), issue);
                }
                BatchWrite::SetDisplayId { key, display_id } => {
                    if let Some(issue) = inner.issues.get_mut(&key) {
                        issue.display_id = Some(display_id);
                        issue.updated_at = now;
                    }
                }
            }
        }

        Ok(count)
    }

    async fn save(&self) -> Result<()> {
        // In-memory storage doesn't persist; the JSONL wrapper overrides this.
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        // No backing store to reload from.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppKey, IssueCategory, Severity};
    use crate::storage::in_memory::new_in_memory_store;

    fn new_issue(title: &str, display_id: Option<&str>) -> NewIssue {
        NewIssue {
            app: AppKey::EdCore,
            title: title.to_string(),
            description: String::new(),
            severity: Severity::S3,
            category: IssueCategory::Unknown,
            reporter: None,
            display_id: display_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn create_assigns_key_and_defaults() {
        let mut store = new_in_memory_store();
        let issue = store.create(new_issue("First", Some("EC-1"))).await.unwrap();

        assert_eq!(issue.id.as_str().len(), 10);
        assert_eq!(issue.display_id.as_deref(), Some("EC-1"));
        assert_eq!(issue.status, "new");
        assert!(!issue.deleted);
    }

    #[tokio::test]
    async fn update_strips_display_identifier() {
        let mut store = new_in_memory_store();
        let issue = store.create(new_issue("Guarded", Some("EC-1"))).await.unwrap();

        let patch: UpdatePatch =
            serde_json::from_str(r#"{"issueId": "EC-999", "status": "reviewed"}"#).unwrap();
        let updated = store.update(&issue.id, patch).await.unwrap();

        assert_eq!(updated.display_id.as_deref(), Some("EC-1"));
        assert_eq!(updated.status, "reviewed");
    }

    #[tokio::test]
    async fn update_missing_issue_is_not_found() {
        let mut store = new_in_memory_store();
        let result = store.update(&DocKey::new("nope"), UpdatePatch::default()).await;
        assert!(matches!(result, Err(Error::IssueNotFound(_))));
    }

    #[tokio::test]
    async fn soft_delete_hides_from_list_but_not_scan() {
        let mut store = new_in_memory_store();
        let issue = store.create(new_issue("Doomed", None)).await.unwrap();

        let patch = UpdatePatch {
            deleted: Some(true),
            ..UpdatePatch::default()
        };
        store.update(&issue.id, patch).await.unwrap();

        assert!(store.list(&IssueFilter::default()).await.unwrap().is_empty());
        assert_eq!(store.scan_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn notes_are_append_only() {
        let mut store = new_in_memory_store();
        let issue = store.create(new_issue("Annotated", None)).await.unwrap();

        for body in ["first", "second"] {
            store
                .add_note(
                    &issue.id,
                    Note {
                        author: "alice".to_string(),
                        body: body.to_string(),
                        at: Utc::now(),
                    },
                )
                .await
                .unwrap();
        }

        let stored = store.get(&issue.id).await.unwrap().unwrap();
        assert_eq!(stored.notes.len(), 2);
        assert_eq!(stored.notes[0].body, "first");
        assert_eq!(stored.notes[1].body, "second");
    }

    #[tokio::test]
    async fn batch_is_validated_before_any_write_applies() {
        let mut store = new_in_memory_store();
        let issue = store.create(new_issue("Target", None)).await.unwrap();

        let batch = vec![
            BatchWrite::SetDisplayId {
                key: issue.id.clone(),
                display_id: "EC-1".to_string(),
            },
            BatchWrite::SetDisplayId {
                key: DocKey::new("missing"),
                display_id: "EC-2".to_string(),
            },
        ];

        let result = store.apply_batch(batch).await;
        assert!(matches!(result, Err(Error::IssueNotFound(_))));

        // First write must not have been applied
        let stored = store.get(&issue.id).await.unwrap().unwrap();
        assert_eq!(stored.display_id, None);
    }

    #[tokio::test]
    async fn batch_over_ceiling_is_rejected_with_zero_writes() {
        let mut store = new_in_memory_store();
        let issue = store.create(new_issue("Target", None)).await.unwrap();

        let batch: Vec<BatchWrite> = (0..=MAX_BATCH_WRITES)
            .map(|n| BatchWrite::SetDisplayId {
                key: issue.id.clone(),
                display_id: format!("EC-{n}"),
            })
            .collect();

        let result = store.apply_batch(batch).await;
        assert!(matches!(result, Err(Error::PreconditionFailed(_))));

        let stored = store.get(&issue.id).await.unwrap().unwrap();
        assert_eq!(stored.display_id, None);
    }

    #[tokio::test]
    async fn list_filters_and_limits() {
        let mut store = new_in_memory_store();
        for n in 0..5 {
            let mut issue = new_issue(&format!("Issue {n}"), None);
            issue.severity = if n % 2 == 0 { Severity::S1 } else { Severity::S3 };
            store.create(issue).await.unwrap();
        }

        let filter = IssueFilter {
            severity: Some(Severity::S1),
            limit: Some(2),
            ..IssueFilter::default()
        };
        let listed = store.list(&filter).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|i| i.severity == Severity::S1));
    }
}
