//! Domain types for the opsdeck issue subsystem.
//!
//! The issue record mirrors what the document store actually holds: a mix of
//! well-typed fields and legacy, partially-populated ones. Serde defaults
//! and aliases absorb the mess at the deserialization boundary so the rest
//! of the crate works with one canonical shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum accepted title length, in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Opaque storage-assigned document key.
///
/// Assigned once at creation and never reinterpreted; display identifiers
/// are a separate, human-facing concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocKey(pub String);

impl DocKey {
    /// Create a new document key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Product namespace an issue belongs to.
///
/// The registry is closed: every app maps to the display-identifier prefix
/// used for issues reported against it, and unknown keys are rejected
/// before any allocation scan runs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum AppKey {
    /// The core learning product.
    #[serde(rename = "edcore")]
    EdCore,

    /// The AI tutoring lab.
    #[serde(rename = "tutorlab")]
    TutorLab,

    /// Engagement analytics.
    #[serde(rename = "pulse")]
    Pulse,
}

impl AppKey {
    /// All registered apps.
    pub const ALL: [AppKey; 3] = [AppKey::EdCore, AppKey::TutorLab, AppKey::Pulse];

    /// The configuration key for this app (e.g. `edcore`).
    pub fn key(self) -> &'static str {
        match self {
            AppKey::EdCore => "edcore",
            AppKey::TutorLab => "tutorlab",
            AppKey::Pulse => "pulse",
        }
    }

    /// The display-identifier prefix for this app (e.g. `EC`).
    pub fn prefix(self) -> &'static str {
        match self {
            AppKey::EdCore => "EC",
            AppKey::TutorLab => "TL",
            AppKey::Pulse => "PL",
        }
    }

    /// Resolve a configuration key (`edcore`) to an app.
    pub fn from_key(key: &str) -> Option<AppKey> {
        Self::ALL.into_iter().find(|app| app.key() == key)
    }

    /// Resolve a display-identifier prefix (`EC`) to an app.
    pub fn from_prefix(prefix: &str) -> Option<AppKey> {
        Self::ALL.into_iter().find(|app| app.prefix() == prefix)
    }
}

impl fmt::Display for AppKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Issue severity, `S1` (critical) through `S4` (low).
///
/// The derived ordering puts `S1` first, which is what every sort in the
/// triage path wants.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum Severity {
    /// Critical: product unusable or trust-destroying.
    S1,
    /// High: visible to users, degraded experience.
    S2,
    /// Medium: the default when a reporter did not say.
    #[default]
    S3,
    /// Low: cosmetic or minor.
    S4,
}

impl Severity {
    /// All severities in urgency order.
    pub const ALL: [Severity; 4] = [Severity::S1, Severity::S2, Severity::S3, Severity::S4];

    /// The canonical label (`S1`..`S4`).
    pub fn label(self) -> &'static str {
        match self {
            Severity::S1 => "S1",
            Severity::S2 => "S2",
            Severity::S3 => "S3",
            Severity::S4 => "S4",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Category key used to judge trust and correctness impact.
///
/// Unrecognized keys in stored documents collapse to [`IssueCategory::Unknown`]
/// rather than failing the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// Sign-in, account access, session handling.
    AuthAccountAccess,
    /// User-visible flows and navigation.
    UxFlow,
    /// Assessment and scoring logic.
    AssessmentScoring,
    /// AI tutoring output quality.
    AiTutorOutput,
    /// Billing and subscription handling.
    BillingSubscription,
    /// Copy, wording, static content.
    ContentCopy,
    /// Latency and resource usage.
    Performance,
    /// Anything the reporter did not categorize.
    #[default]
    Unknown,
}

impl<'de> Deserialize<'de> for IssueCategory {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(IssueCategory::from_stored_key(&raw))
    }
}

impl IssueCategory {
    /// Resolve a stored category key, collapsing anything unrecognized to
    /// [`IssueCategory::Unknown`].
    pub fn from_stored_key(raw: &str) -> IssueCategory {
        match raw {
            "auth_account_access" => IssueCategory::AuthAccountAccess,
            "ux_flow" => IssueCategory::UxFlow,
            "assessment_scoring" => IssueCategory::AssessmentScoring,
            "ai_tutor_output" => IssueCategory::AiTutorOutput,
            "billing_subscription" => IssueCategory::BillingSubscription,
            "content_copy" => IssueCategory::ContentCopy,
            "performance" => IssueCategory::Performance,
            _ => IssueCategory::Unknown,
        }
    }
    /// Whether a defect in this category damages tester or user trust.
    ///
    /// These are the categories eligible for Fix-Now routing.
    pub fn is_trust_impacting(self) -> bool {
        matches!(
            self,
            IssueCategory::AuthAccountAccess
                | IssueCategory::UxFlow
                | IssueCategory::AssessmentScoring
                | IssueCategory::AiTutorOutput
                | IssueCategory::BillingSubscription
        )
    }

    /// The stored key for this category.
    pub fn key(self) -> &'static str {
        match self {
            IssueCategory::AuthAccountAccess => "auth_account_access",
            IssueCategory::UxFlow => "ux_flow",
            IssueCategory::AssessmentScoring => "assessment_scoring",
            IssueCategory::AiTutorOutput => "ai_tutor_output",
            IssueCategory::BillingSubscription => "billing_subscription",
            IssueCategory::ContentCopy => "content_copy",
            IssueCategory::Performance => "performance",
            IssueCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Explicit triage override set by an operator.
///
/// When present this short-circuits heuristic classification entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Must be fixed before anything else.
    Blocking,
    /// Output is misleading; a messaging signal, not a stop-ship.
    Misleading,
    /// Erodes tester trust; a signal to watch.
    Trust,
    /// Cosmetic regardless of reported severity.
    Cosmetic,
}

/// Status vocabulary helpers.
///
/// Status is stored as a free-form string; only a fixed closed set of
/// values counts as terminal, and only `new`/`reviewed` count as
/// actionable for Fix-Now routing.
pub mod status {
    /// Statuses that close out an issue.
    pub const TERMINAL: [&str; 5] = ["closed", "resolved", "released", "archived", "done"];

    /// Statuses eligible for Fix-Now routing (work has not started yet).
    pub const ACTIONABLE: [&str; 2] = ["new", "reviewed"];

    /// The status assigned when a reporter did not provide one.
    pub const DEFAULT: &str = "new";

    /// Whether the given status closes out an issue.
    pub fn is_terminal(status: &str) -> bool {
        TERMINAL.contains(&status)
    }

    /// Whether the given status is eligible for Fix-Now routing.
    pub fn is_actionable(status: &str) -> bool {
        ACTIONABLE.contains(&status)
    }

    /// Normalize a raw status to the closed workflow vocabulary.
    ///
    /// Known values pass through canonicalized; unknown or missing values
    /// default to `new`. Used by bulk import, which must not fail on
    /// messy input rows.
    pub fn normalize(raw: Option<&str>) -> &'static str {
        let raw = match raw {
            Some(r) => r.trim().to_ascii_lowercase(),
            None => return DEFAULT,
        };
        const KNOWN: [&str; 9] = [
            "new",
            "reviewed",
            "in_progress",
            "working",
            "closed",
            "resolved",
            "released",
            "archived",
            "done",
        ];
        KNOWN
            .into_iter()
            .find(|known| *known == raw)
            .unwrap_or(DEFAULT)
    }
}

fn default_status() -> String {
    status::DEFAULT.to_string()
}

/// An admin annotation on an issue. Notes are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Who wrote the note.
    pub author: String,

    /// The note body.
    pub body: String,

    /// When the note was appended.
    pub at: DateTime<Utc>,
}

/// An issue record as held by the document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Storage-assigned document key; immutable; primary key.
    pub id: DocKey,

    /// Human-facing identifier of the form `<PREFIX>-<N>`.
    ///
    /// Write-once after first successful assignment. The serde aliases
    /// absorb the legacy field names older writers used.
    #[serde(default, alias = "issueId", alias = "issue_id")]
    pub display_id: Option<String>,

    /// Product namespace; drives the display-identifier prefix.
    pub app: AppKey,

    /// Reported severity; `S3` when the reporter did not say.
    #[serde(default)]
    pub severity: Severity,

    /// Free-form workflow status; `new` when absent.
    #[serde(default = "default_status")]
    pub status: String,

    /// Category key, stored as `type`.
    #[serde(rename = "type", default)]
    pub category: IssueCategory,

    /// Explicit operator override for triage routing.
    #[serde(default)]
    pub classification: Option<Classification>,

    /// Soft-delete flag; deleted issues never appear in triage.
    #[serde(default)]
    pub deleted: bool,

    /// Issue title.
    pub title: String,

    /// Detailed description.
    #[serde(default)]
    pub description: String,

    /// The user who reported the issue, when known.
    #[serde(default, alias = "userId", alias = "user_id")]
    pub reporter: Option<String>,

    /// Creation timestamp; older writers stored this as `timestamp`.
    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,

    /// Append-only admin annotations.
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Issue {
    /// Whether the issue is open: not soft-deleted and not in a terminal
    /// status.
    pub fn is_open(&self) -> bool {
        !self.deleted && !status::is_terminal(&self.status)
    }
}

/// Data for creating a new issue.
#[derive(Debug, Clone)]
pub struct NewIssue {
    /// Product namespace.
    pub app: AppKey,

    /// Issue title.
    pub title: String,

    /// Detailed description.
    pub description: String,

    /// Reported severity.
    pub severity: Severity,

    /// Category key.
    pub category: IssueCategory,

    /// Reporting user, when known.
    pub reporter: Option<String>,

    /// Display identifier computed by the allocator, when the creation
    /// path ran one. `None` leaves the record for the backfill pass.
    pub display_id: Option<String>,
}

impl NewIssue {
    /// Validate creation data.
    ///
    /// # Errors
    ///
    /// Returns a message when the title is empty or too long.
    pub fn validate(&self) -> std::result::Result<(), String> {
        validate_title(&self.title)
    }
}

/// Validate an issue title.
///
/// # Errors
///
/// Returns a message when the title is empty or longer than
/// [`MAX_TITLE_LENGTH`] characters.
pub fn validate_title(title: &str) -> std::result::Result<(), String> {
    if title.trim().is_empty() {
        return Err("title must not be empty".to_string());
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!("title cannot exceed {MAX_TITLE_LENGTH} characters"));
    }
    Ok(())
}

/// An ordinary update payload, as received from a client.
///
/// Only fields present are modified. The payload deliberately *can*
/// carry the identifier fields (including the legacy spellings) so that
/// arbitrary client JSON is representable; the store's update path strips
/// them unconditionally, which is what makes `display_id` write-once.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePatch {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,

    /// New description.
    #[serde(default)]
    pub description: Option<String>,

    /// New severity.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// New status.
    #[serde(default)]
    pub status: Option<String>,

    /// New category.
    #[serde(rename = "type", default)]
    pub category: Option<IssueCategory>,

    /// New explicit classification.
    #[serde(default)]
    pub classification: Option<Classification>,

    /// Soft-delete or restore.
    #[serde(default)]
    pub deleted: Option<bool>,

    /// Identifier field carried by the payload. Always stripped: no
    /// update path may overwrite an assigned display identifier.
    #[serde(default, alias = "issueId", alias = "issue_id")]
    pub display_id: Option<String>,
}

impl UpdatePatch {
    /// Whether the patch changes nothing after identifier stripping.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.severity.is_none()
            && self.status.is_none()
            && self.category.is_none()
            && self.classification.is_none()
            && self.deleted.is_none()
    }
}

/// Filter for the ordinary (ordered, limited) issue read path.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    /// Filter by app.
    pub app: Option<AppKey>,

    /// Filter by severity.
    pub severity: Option<Severity>,

    /// Filter by exact status string.
    pub status: Option<String>,

    /// Limit number of results.
    pub limit: Option<usize>,
}
