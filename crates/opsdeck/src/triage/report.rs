//! The operator report: ordered buckets with resolved assignees.
//!
//! This is the externally visible result of the subsystem. The composer
//! wraps classifier output, orders each bucket deterministically, and
//! resolves every reporter identifier to a display label through an
//! injected directory lookup.

use super::classify::{Bucket, TriageSummary, classify, sort_for_queue};
use crate::domain::{DocKey, Issue};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Label used when a record has no reporter at all.
const UNASSIGNED: &str = "Unassigned";

/// Characters of a raw identifier kept in the unknown-reporter label.
const UNKNOWN_ID_PREVIEW: usize = 8;

/// Lookup from a raw user identifier to a display name.
///
/// Injected so the report composer stays pure; the console wires in its
/// user directory, tests wire in a map.
pub trait AssigneeDirectory {
    /// Resolve a user identifier to a display name, if known.
    fn display_name(&self, user_id: &str) -> Option<String>;
}

/// Directory backed by a static map (config-file `users` section).
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    names: HashMap<String, String>,
}

impl StaticDirectory {
    /// Build a directory from `(user id, display name)` pairs.
    pub fn new(names: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }
}

impl AssigneeDirectory for StaticDirectory {
    fn display_name(&self, user_id: &str) -> Option<String> {
        self.names.get(user_id).cloned()
    }
}

/// One report line.
#[derive(Debug, Clone, Serialize)]
pub struct ReportItem {
    /// Document key of the underlying record.
    pub key: DocKey,

    /// Display identifier, when assigned.
    pub display_id: Option<String>,

    /// Issue title.
    pub title: String,

    /// Severity label (`S1`..`S4`).
    pub severity: String,

    /// Current workflow status.
    pub status: String,

    /// Category key.
    pub category: String,

    /// Resolved assignee label.
    pub assignee: String,

    /// Justification for the bucket placement.
    pub reason: String,

    /// Creation timestamp, kept for queue-order context.
    pub created_at: DateTime<Utc>,
}

/// The composed operator report.
#[derive(Debug, Clone, Serialize)]
pub struct TriageReport {
    /// Drop-everything items, most severe and oldest first.
    pub fix_now: Vec<ReportItem>,

    /// Next-in-line items, most severe and oldest first.
    pub fix_next: Vec<ReportItem>,

    /// Deferred items.
    pub parked: Vec<ReportItem>,

    /// Aggregate risk signals over the open set.
    pub summary: TriageSummary,
}

/// Resolve a reporter identifier to a display label.
///
/// Lookup first; on a miss, a missing reporter reads as unassigned, an
/// email-looking identifier is shown raw, and anything else is shown as
/// a truncated unknown.
pub fn resolve_assignee(directory: &dyn AssigneeDirectory, reporter: Option<&str>) -> String {
    let Some(user_id) = reporter else {
        return UNASSIGNED.to_string();
    };
    if let Some(name) = directory.display_name(user_id) {
        return name;
    }
    if user_id.contains('@') {
        return user_id.to_string();
    }
    let preview: String = user_id.chars().take(UNKNOWN_ID_PREVIEW).collect();
    format!("Unknown ({preview}...)")
}

/// Classify the open set and compose the report.
///
/// Buckets come out in work-queue order: severity ascending, then oldest
/// first, then document key. Pure and read-only.
pub fn compose_report(open: Vec<Issue>, directory: &dyn AssigneeDirectory) -> TriageReport {
    let outcome = classify(open);
    let summary = outcome.summary;

    let mut routed = outcome.routed;
    sort_for_queue(&mut routed);

    let mut fix_now = Vec::new();
    let mut fix_next = Vec::new();
    let mut parked = Vec::new();

    for entry in routed {
        let assignee = resolve_assignee(directory, entry.issue.reporter.as_deref());
        let issue = entry.issue;
        let item = ReportItem {
            key: issue.id,
            display_id: issue.display_id,
            title: issue.title,
            severity: issue.severity.label().to_string(),
            status: issue.status,
            category: issue.category.key().to_string(),
            assignee,
            reason: entry.reason,
            created_at: issue.created_at,
        };
        match entry.bucket {
            Bucket::FixNow => fix_now.push(item),
            Bucket::FixNext => fix_next.push(item),
            Bucket::Parked => parked.push(item),
        }
    }

    TriageReport {
        fix_now,
        fix_next,
        parked,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppKey, IssueCategory, Severity};
    use chrono::TimeZone;
    use rstest::rstest;

    fn directory() -> StaticDirectory {
        StaticDirectory::new([("u_4931".to_string(), "Priya Sharma".to_string())])
    }

    #[rstest]
    #[case::missing(None, "Unassigned")]
    #[case::known(Some("u_4931"), "Priya Sharma")]
    #[case::email_miss(Some("alex@example.com"), "alex@example.com")]
    #[case::opaque_miss(Some("svc_account_d41d8cd98f"), "Unknown (svc_acco...)")]
    #[case::short_opaque_miss(Some("u99"), "Unknown (u99...)")]
    fn assignee_resolution(#[case] reporter: Option<&str>, #[case] expected: &str) {
        assert_eq!(resolve_assignee(&directory(), reporter), expected);
    }

    fn issue(key: &str, severity: Severity, reporter: Option<&str>, created_min: u32) -> Issue {
        Issue {
            id: DocKey::new(key),
            display_id: Some(format!("EC-{created_min}")),
            app: AppKey::EdCore,
            severity,
            status: "new".to_string(),
            category: IssueCategory::AuthAccountAccess,
            classification: None,
            deleted: false,
            title: format!("issue {key}"),
            description: String::new(),
            reporter: reporter.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2026, 6, 1, 0, created_min, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 6, 1, 0, created_min, 0).unwrap(),
            notes: Vec::new(),
        }
    }

    #[test]
    fn report_orders_buckets_oldest_most_severe_first() {
        let open = vec![
            issue("k-young-s1", Severity::S1, None, 30),
            issue("k-old-s1", Severity::S1, Some("u_4931"), 1),
            issue("k-s3", Severity::S3, None, 2),
            issue("k-s4", Severity::S4, None, 3),
        ];

        let report = compose_report(open, &directory());

        let fix_now_keys: Vec<&str> = report.fix_now.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(fix_now_keys, vec!["k-old-s1", "k-young-s1"]);
        assert_eq!(report.fix_now[0].assignee, "Priya Sharma");
        assert_eq!(report.fix_next.len(), 1);
        assert_eq!(report.parked.len(), 1);
        assert!(report.summary.critical_risk_present);
    }

    #[test]
    fn report_serializes_for_the_console() {
        let report = compose_report(vec![issue("k1", Severity::S2, None, 0)], &directory());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["fix_now"].is_array());
        assert_eq!(json["fix_now"][0]["assignee"], "Unassigned");
        assert_eq!(json["summary"]["tester_trust_risk_present"], true);
    }
}
