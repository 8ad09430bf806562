//! The triage subsystem.
//!
//! A pure, synchronous transform from the current open-issue set to a
//! decision-ready operator report: three priority buckets (Fix-Now,
//! Fix-Next, Parked) with a justification per item, deterministic
//! ordering, and aggregate risk signals. No scheduler, no store access,
//! no audit; callers hand in an already-fetched list and render the
//! result.
//!
//! Classification is a deterministic ordered rule list, not a dispatch
//! hierarchy, so every rule outcome is enumerable in tests. Malformed
//! input never fails classification: missing severity, status, and
//! category have already degraded to their documented defaults at the
//! deserialization boundary.

pub mod classify;
pub mod report;

pub use classify::{
    Bucket, RoutedIssue, TRIAGE_RULES, TriageOutcome, TriageRule, TriageSummary, classify,
    open_issues, sort_for_queue,
};
pub use report::{AssigneeDirectory, ReportItem, StaticDirectory, TriageReport, compose_report};
