//! Bulk import rows and normalization.
//!
//! The import interface accepts already-parsed rows (the CSV/JSON parsing
//! UI lives elsewhere); this module owns the normalization rules and the
//! conversion into fully-formed issue documents for one atomic insert
//! batch.

use crate::domain::{self, AppKey, DocKey, Issue, IssueCategory, Severity, status};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Maximum rows accepted by one bulk import invocation.
pub const MAX_IMPORT_ROWS: usize = 500;

/// One bulk import row, as handed over by the import UI.
///
/// Everything but the title is optional; missing values take the
/// documented defaults (`S3`, `new`, `unknown`).
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRow {
    /// Issue title. Required.
    pub title: String,

    /// Reported severity; defaults to `S3`.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Raw status; normalized to the closed workflow set, defaulting
    /// unknown or missing values to `new`.
    #[serde(default)]
    pub status: Option<String>,

    /// Category key; unknown keys collapse to `unknown`.
    #[serde(rename = "category", alias = "type", default)]
    pub category: Option<IssueCategory>,

    /// Detailed description.
    #[serde(default)]
    pub description: Option<String>,

    /// Reporting user.
    #[serde(default, alias = "userId", alias = "user_id")]
    pub reporter: Option<String>,
}

/// Validate a batch of rows before any scan or write happens.
///
/// # Errors
///
/// - `Error::InvalidArgument` for an empty batch or an invalid title
/// - `Error::PreconditionFailed` when the batch exceeds [`MAX_IMPORT_ROWS`]
pub fn validate_rows(rows: &[ImportRow]) -> Result<()> {
    if rows.is_empty() {
        return Err(Error::InvalidArgument(
            "import batch must contain at least one row".to_string(),
        ));
    }
    if rows.len() > MAX_IMPORT_ROWS {
        return Err(Error::PreconditionFailed(format!(
            "import batch of {} rows exceeds the ceiling of {MAX_IMPORT_ROWS}",
            rows.len()
        )));
    }
    for (index, row) in rows.iter().enumerate() {
        domain::validate_title(&row.title)
            .map_err(|e| Error::InvalidArgument(format!("row {}: {e}", index + 1)))?;
    }
    Ok(())
}

/// Convert one normalized row into an issue document.
///
/// The document key and display identifier are supplied by the caller:
/// the key comes from the store's generator seeded with the existing key
/// set, the identifier from an allocator sequence seeded once for the
/// whole batch.
pub fn row_into_issue(
    row: ImportRow,
    app: AppKey,
    key: DocKey,
    display_id: String,
    now: DateTime<Utc>,
) -> Issue {
    Issue {
        id: key,
        display_id: Some(display_id),
        app,
        severity: row.severity.unwrap_or_default(),
        status: status::normalize(row.status.as_deref()).to_string(),
        category: row.category.unwrap_or_default(),
        classification: None,
        deleted: false,
        title: row.title,
        description: row.description.unwrap_or_default(),
        reporter: row.reporter,
        created_at: now,
        updated_at: now,
        notes: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn row(title: &str) -> ImportRow {
        ImportRow {
            title: title.to_string(),
            severity: None,
            status: None,
            category: None,
            description: None,
            reporter: None,
        }
    }

    #[test]
    fn empty_batch_is_invalid() {
        assert!(matches!(
            validate_rows(&[]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn oversized_batch_fails_precondition() {
        let rows: Vec<ImportRow> = (0..=MAX_IMPORT_ROWS).map(|n| row(&format!("r{n}"))).collect();
        assert!(matches!(
            validate_rows(&rows),
            Err(Error::PreconditionFailed(_))
        ));
    }

    #[test]
    fn blank_title_is_reported_with_row_number() {
        let rows = vec![row("ok"), row("  ")];
        let err = validate_rows(&rows).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[rstest]
    #[case::missing(None, "new")]
    #[case::unknown(Some("escalated!"), "new")]
    #[case::known(Some("reviewed"), "reviewed")]
    fn row_status_is_normalized(#[case] raw: Option<&str>, #[case] expected: &str) {
        let mut r = row("Imported");
        r.status = raw.map(str::to_string);
        let issue = row_into_issue(
            r,
            AppKey::EdCore,
            DocKey::new("k1"),
            "EC-8".to_string(),
            Utc::now(),
        );
        assert_eq!(issue.status, expected);
        assert_eq!(issue.severity, Severity::S3);
        assert_eq!(issue.category, IssueCategory::Unknown);
        assert_eq!(issue.display_id.as_deref(), Some("EC-8"));
    }

    #[test]
    fn row_deserializes_from_loose_json() {
        let raw = r#"{"title": "From sheet", "severity": "S1", "type": "billing_subscription", "status": "Reviewed"}"#;
        let parsed: ImportRow = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.severity, Some(Severity::S1));
        assert_eq!(parsed.category, Some(IssueCategory::BillingSubscription));
    }
}
