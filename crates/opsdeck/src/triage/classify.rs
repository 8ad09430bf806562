//! Priority bucket classification.

use crate::domain::{Classification, Issue, Severity, status};
use serde::Serialize;
use std::collections::BTreeMap;

/// The three triage priority buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Drop everything and fix.
    FixNow,
    /// Next in line once Fix-Now is clear.
    FixNext,
    /// Safe to defer.
    Parked,
}

/// An open issue routed to a bucket with its justification.
#[derive(Debug, Clone)]
pub struct RoutedIssue {
    /// The issue being routed.
    pub issue: Issue,

    /// The bucket it landed in.
    pub bucket: Bucket,

    /// Human-readable justification for the routing.
    pub reason: String,
}

/// One rule in the classification table.
///
/// Rules are evaluated in [`TRIAGE_RULES`] order per issue; the first
/// rule that returns a routing wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageRule {
    /// An operator's explicit classification short-circuits everything.
    ExplicitOverride,

    /// Severity, status, and category together qualify for Fix-Now.
    FixNowEligibility,

    /// Low severity parks regardless of anything else.
    ParkLowSeverity,

    /// Whatever remains is scheduled by severity; total over S1-S3.
    DeferBySeverity,
}

/// The classification table, in evaluation order.
pub const TRIAGE_RULES: [TriageRule; 4] = [
    TriageRule::ExplicitOverride,
    TriageRule::FixNowEligibility,
    TriageRule::ParkLowSeverity,
    TriageRule::DeferBySeverity,
];

impl TriageRule {
    /// Apply this rule to an issue, returning a routing if it matches.
    pub fn route(self, issue: &Issue) -> Option<(Bucket, String)> {
        match self {
            TriageRule::ExplicitOverride => match issue.classification? {
                Classification::Blocking => Some((
                    Bucket::FixNow,
                    "explicitly classified as blocking".to_string(),
                )),
                // The misleading/trust signal path folds into Fix-Next in
                // the three-bucket report
                Classification::Misleading => Some((
                    Bucket::FixNext,
                    "classified as misleading, tracked as a messaging signal".to_string(),
                )),
                Classification::Trust => Some((
                    Bucket::FixNext,
                    "classified as a trust signal, tracked alongside Fix-Next".to_string(),
                )),
                Classification::Cosmetic => Some((
                    Bucket::Parked,
                    "explicitly classified as cosmetic".to_string(),
                )),
            },
            TriageRule::FixNowEligibility => {
                let eligible = matches!(issue.severity, Severity::S1 | Severity::S2)
                    && status::is_actionable(&issue.status)
                    && issue.category.is_trust_impacting();
                if !eligible {
                    return None;
                }
                let reason = match issue.severity {
                    Severity::S1 => format!(
                        "S1 in {} blocks tester trust, fix before anything else",
                        issue.category
                    ),
                    _ => format!("S2 in {} is visible to users", issue.category),
                };
                Some((Bucket::FixNow, reason))
            }
            TriageRule::ParkLowSeverity => match issue.severity {
                Severity::S4 => Some((Bucket::Parked, "low severity, safe to defer".to_string())),
                _ => None,
            },
            TriageRule::DeferBySeverity => match issue.severity {
                // An S1 that failed Fix-Now eligibility is never dropped
                Severity::S1 => Some((
                    Bucket::FixNext,
                    format!(
                        "S1 outside Fix-Now criteria (status '{}'), may already be in progress",
                        issue.status
                    ),
                )),
                Severity::S2 => Some((
                    Bucket::FixNext,
                    "outside Fix-Now criteria".to_string(),
                )),
                Severity::S3 => Some((
                    Bucket::FixNext,
                    "address when Fix-Now is clear".to_string(),
                )),
                Severity::S4 => Some((Bucket::Parked, "low severity, safe to defer".to_string())),
            },
        }
    }
}

/// Aggregate risk signals over the open set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageSummary {
    /// Open issue count per severity label.
    pub severity_counts: BTreeMap<String, usize>,

    /// At least one open S1 exists.
    pub critical_risk_present: bool,

    /// An open S1/S2 exists in a trust-impacting category.
    pub tester_trust_risk_present: bool,
}

/// Result of classifying the open set.
#[derive(Debug, Clone)]
pub struct TriageOutcome {
    /// Every open issue, routed.
    pub routed: Vec<RoutedIssue>,

    /// Aggregate signals.
    pub summary: TriageSummary,
}

/// Filter a full scan down to the open set: not soft-deleted, status not
/// terminal.
pub fn open_issues(issues: &[Issue]) -> Vec<Issue> {
    issues
        .iter()
        .filter(|issue| issue.is_open())
        .cloned()
        .collect()
}

/// Classify the open set into buckets.
///
/// Every issue lands in exactly one bucket: the rule table ends with a
/// total rule, so nothing is ever silently dropped. Input is expected to
/// be pre-filtered through [`open_issues`].
pub fn classify(open: Vec<Issue>) -> TriageOutcome {
    let summary = summarize(&open);

    let routed = open
        .into_iter()
        .map(|issue| {
            let (bucket, reason) = route(&issue);
            RoutedIssue {
                issue,
                bucket,
                reason,
            }
        })
        .collect();

    TriageOutcome { routed, summary }
}

/// Route one issue through the rule table, first match wins.
fn route(issue: &Issue) -> (Bucket, String) {
    for rule in TRIAGE_RULES {
        if let Some(routing) = rule.route(issue) {
            return routing;
        }
    }
    // DeferBySeverity is total over all severities, so the table always
    // routes; this arm is unreachable but keeps the function total
    // without panicking on future rule edits.
    (
        Bucket::FixNext,
        "unmatched by classification table".to_string(),
    )
}

fn summarize(open: &[Issue]) -> TriageSummary {
    let mut severity_counts: BTreeMap<String, usize> = Severity::ALL
        .iter()
        .map(|severity| (severity.label().to_string(), 0))
        .collect();
    for issue in open {
        *severity_counts
            .entry(issue.severity.label().to_string())
            .or_insert(0) += 1;
    }

    let critical_risk_present = open.iter().any(|issue| issue.severity == Severity::S1);
    let tester_trust_risk_present = open.iter().any(|issue| {
        matches!(issue.severity, Severity::S1 | Severity::S2)
            && issue.category.is_trust_impacting()
    });

    TriageSummary {
        severity_counts,
        critical_risk_present,
        tester_trust_risk_present,
    }
}

/// Sort routed issues for work-queue presentation: most severe first,
/// oldest first within a severity, document key as the final tiebreaker.
pub fn sort_for_queue(routed: &mut [RoutedIssue]) {
    routed.sort_by(|a, b| {
        a.issue
            .severity
            .cmp(&b.issue.severity)
            .then_with(|| a.issue.created_at.cmp(&b.issue.created_at))
            .then_with(|| a.issue.id.cmp(&b.issue.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppKey, DocKey, IssueCategory};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn issue(
        key: &str,
        severity: Severity,
        status: &str,
        category: IssueCategory,
        classification: Option<Classification>,
    ) -> Issue {
        Issue {
            id: DocKey::new(key),
            display_id: Some(format!("EC-{}", key.len())),
            app: AppKey::EdCore,
            severity,
            status: status.to_string(),
            category,
            classification,
            deleted: false,
            title: format!("issue {key}"),
            description: String::new(),
            reporter: None,
            created_at: Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
            notes: Vec::new(),
        }
    }

    #[rstest]
    #[case::blocking_override(
        Severity::S3,
        "new",
        IssueCategory::ContentCopy,
        Some(Classification::Blocking),
        Bucket::FixNow
    )]
    #[case::cosmetic_override_beats_s1(
        Severity::S1,
        "new",
        IssueCategory::AuthAccountAccess,
        Some(Classification::Cosmetic),
        Bucket::Parked
    )]
    #[case::misleading_folds_into_fix_next(
        Severity::S2,
        "new",
        IssueCategory::AiTutorOutput,
        Some(Classification::Misleading),
        Bucket::FixNext
    )]
    #[case::trust_folds_into_fix_next(
        Severity::S3,
        "new",
        IssueCategory::AiTutorOutput,
        Some(Classification::Trust),
        Bucket::FixNext
    )]
    #[case::s1_actionable_trust_category(
        Severity::S1,
        "new",
        IssueCategory::AuthAccountAccess,
        None,
        Bucket::FixNow
    )]
    #[case::s2_reviewed_trust_category(
        Severity::S2,
        "reviewed",
        IssueCategory::BillingSubscription,
        None,
        Bucket::FixNow
    )]
    #[case::s1_already_in_progress(
        Severity::S1,
        "in_progress",
        IssueCategory::BillingSubscription,
        None,
        Bucket::FixNext
    )]
    #[case::s1_non_trust_category(
        Severity::S1,
        "new",
        IssueCategory::Performance,
        None,
        Bucket::FixNext
    )]
    #[case::s2_outside_criteria(
        Severity::S2,
        "new",
        IssueCategory::ContentCopy,
        None,
        Bucket::FixNext
    )]
    #[case::s3_defers(Severity::S3, "new", IssueCategory::UxFlow, None, Bucket::FixNext)]
    #[case::s4_parks(
        Severity::S4,
        "new",
        IssueCategory::AuthAccountAccess,
        None,
        Bucket::Parked
    )]
    fn rule_table_outcomes(
        #[case] severity: Severity,
        #[case] status: &str,
        #[case] category: IssueCategory,
        #[case] classification: Option<Classification>,
        #[case] expected: Bucket,
    ) {
        let outcome = classify(vec![issue("k1", severity, status, category, classification)]);
        assert_eq!(outcome.routed.len(), 1);
        assert_eq!(outcome.routed[0].bucket, expected);
    }

    #[test]
    fn stalled_s1_reason_references_its_status() {
        let outcome = classify(vec![issue(
            "k1",
            Severity::S1,
            "in_progress",
            IssueCategory::BillingSubscription,
            None,
        )]);
        let routed = &outcome.routed[0];
        assert_eq!(routed.bucket, Bucket::FixNext);
        assert!(routed.reason.contains("in_progress"));
        assert!(routed.reason.contains("in progress"));
    }

    #[test]
    fn fix_now_reasons_differentiate_severity() {
        let outcome = classify(vec![
            issue("k1", Severity::S1, "new", IssueCategory::AuthAccountAccess, None),
            issue("k22", Severity::S2, "new", IssueCategory::UxFlow, None),
        ]);
        let s1 = outcome
            .routed
            .iter()
            .find(|r| r.issue.severity == Severity::S1)
            .unwrap();
        let s2 = outcome
            .routed
            .iter()
            .find(|r| r.issue.severity == Severity::S2)
            .unwrap();
        assert!(s1.reason.contains("blocks tester trust"));
        assert!(s2.reason.contains("visible to users"));
    }

    #[test]
    fn open_filter_drops_deleted_and_terminal() {
        let mut deleted = issue("k1", Severity::S1, "new", IssueCategory::UxFlow, None);
        deleted.deleted = true;
        let closed = issue("k22", Severity::S1, "resolved", IssueCategory::UxFlow, None);
        let open = issue("k333", Severity::S1, "new", IssueCategory::UxFlow, None);

        let filtered = open_issues(&[deleted, closed, open]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, DocKey::new("k333"));
    }

    #[test]
    fn summary_counts_and_flags() {
        let outcome = classify(vec![
            issue("k1", Severity::S1, "new", IssueCategory::AuthAccountAccess, None),
            issue("k22", Severity::S2, "new", IssueCategory::ContentCopy, None),
            issue("k333", Severity::S3, "new", IssueCategory::UxFlow, None),
            issue("k4444", Severity::S3, "new", IssueCategory::Unknown, None),
        ]);

        assert_eq!(outcome.summary.severity_counts["S1"], 1);
        assert_eq!(outcome.summary.severity_counts["S2"], 1);
        assert_eq!(outcome.summary.severity_counts["S3"], 2);
        assert_eq!(outcome.summary.severity_counts["S4"], 0);
        assert!(outcome.summary.critical_risk_present);
        assert!(outcome.summary.tester_trust_risk_present);
    }

    #[test]
    fn trust_risk_requires_trust_category() {
        let outcome = classify(vec![issue(
            "k1",
            Severity::S2,
            "new",
            IssueCategory::ContentCopy,
            None,
        )]);
        assert!(!outcome.summary.critical_risk_present);
        assert!(!outcome.summary.tester_trust_risk_present);
    }

    #[test]
    fn queue_sort_is_severity_then_age_then_key() {
        let mut old_s2 = issue("k-a", Severity::S2, "new", IssueCategory::UxFlow, None);
        old_s2.created_at = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let new_s1 = issue("k-b", Severity::S1, "new", IssueCategory::UxFlow, None);
        let tie_1 = issue("k-c", Severity::S3, "new", IssueCategory::UxFlow, None);
        let tie_2 = issue("k-d", Severity::S3, "new", IssueCategory::UxFlow, None);

        let outcome = classify(vec![old_s2, new_s1, tie_2, tie_1]);
        let mut routed = outcome.routed;
        sort_for_queue(&mut routed);

        let keys: Vec<&str> = routed.iter().map(|r| r.issue.id.as_str()).collect();
        assert_eq!(keys, vec!["k-b", "k-a", "k-c", "k-d"]);
    }
}
