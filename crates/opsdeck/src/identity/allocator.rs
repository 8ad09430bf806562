//! Display identifier allocation.
//!
//! Allocation is a pure function over a full-collection snapshot: track
//! the maximum suffix observed for the prefix, return max + 1. It holds
//! no lock and never retries; two concurrent creations can compute the
//! same number, and the repair pass resolves that afterwards.

use super::parse::{effective_display_id, max_suffix_for};
use crate::domain::{AppKey, Issue};
use crate::error::{Error, Result};

/// Compute the next unused display identifier for an app key.
///
/// `issues` must be the *unfiltered* full-collection scan, soft-deleted
/// records included: excluding anything risks missing a high suffix and
/// minting a duplicate. The app key is validated against the registry
/// before the scan is even looked at.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` for an app key outside the registry.
pub fn next_display_id(issues: &[Issue], app_key: &str) -> Result<String> {
    let app = AppKey::from_key(app_key).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "unknown app key '{app_key}' (registered: {})",
            registered_keys()
        ))
    })?;
    Ok(next_for_app(issues, app))
}

/// Typed variant of [`next_display_id`] for callers that already hold a
/// registry entry.
pub fn next_for_app(issues: &[Issue], app: AppKey) -> String {
    let max = max_suffix_for(issues, app);
    format!("{}-{}", app.prefix(), max + 1)
}

fn registered_keys() -> String {
    AppKey::ALL
        .iter()
        .map(|app| app.key())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A sequence of display identifiers seeded once from a scan.
///
/// Bulk import seeds this a single time before the batch, then draws one
/// identifier per row; seeding per row would re-scan and hand every row
/// the same number.
#[derive(Debug)]
pub struct DisplayIdSequence {
    app: AppKey,
    next_suffix: u64,
}

impl DisplayIdSequence {
    /// Seed a sequence at `max + 1` for the given app.
    pub fn seeded(issues: &[Issue], app: AppKey) -> Self {
        Self {
            app,
            next_suffix: max_suffix_for(issues, app) + 1,
        }
    }

    /// Draw the next identifier, advancing the sequence.
    pub fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.app.prefix(), self.next_suffix);
        self.next_suffix += 1;
        id
    }
}

/// Whether a record carries any parsable identifier.
///
/// Convenience wrapper used by callers that only need the yes/no answer.
pub fn has_display_id(issue: &Issue) -> bool {
    effective_display_id(issue).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DocKey, IssueCategory, Severity};
    use chrono::{TimeZone, Utc};

    fn issue(key: &str, app: AppKey, display_id: Option<&str>, deleted: bool) -> Issue {
        Issue {
            id: DocKey::new(key),
            display_id: display_id.map(str::to_string),
            app,
            severity: Severity::S3,
            status: "new".to_string(),
            category: IssueCategory::Unknown,
            classification: None,
            deleted,
            title: format!("issue {key}"),
            description: String::new(),
            reporter: None,
            created_at: Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
            notes: Vec::new(),
        }
    }

    #[test]
    fn next_is_max_plus_one_regardless_of_input_order() {
        let forward = vec![
            issue("k1", AppKey::EdCore, Some("EC-3"), false),
            issue("k2", AppKey::EdCore, Some("EC-12"), false),
            issue("k3", AppKey::EdCore, Some("EC-7"), false),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(next_display_id(&forward, "edcore").unwrap(), "EC-13");
        assert_eq!(next_display_id(&reversed, "edcore").unwrap(), "EC-13");
    }

    #[test]
    fn empty_collection_starts_at_one() {
        assert_eq!(next_display_id(&[], "pulse").unwrap(), "PL-1");
    }

    #[test]
    fn unknown_app_key_fails_before_scanning() {
        let err = next_display_id(&[], "storefront").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(err.to_string().contains("storefront"));
    }

    #[test]
    fn prefixes_are_independent_namespaces() {
        let issues = vec![
            issue("k1", AppKey::EdCore, Some("EC-40"), false),
            issue("k2", AppKey::TutorLab, Some("TL-2"), false),
        ];
        assert_eq!(next_display_id(&issues, "tutorlab").unwrap(), "TL-3");
        assert_eq!(next_display_id(&issues, "edcore").unwrap(), "EC-41");
    }

    #[test]
    fn deleted_records_still_hold_their_suffix() {
        let issues = vec![
            issue("k1", AppKey::EdCore, Some("EC-9"), true),
            issue("k2", AppKey::EdCore, Some("EC-2"), false),
        ];
        assert_eq!(next_display_id(&issues, "edcore").unwrap(), "EC-10");
    }

    #[test]
    fn identifier_shaped_storage_keys_count_in_the_scan() {
        // An ancient import path used the identifier as the document key
        let issues = vec![issue("EC-21", AppKey::EdCore, None, false)];
        assert_eq!(next_display_id(&issues, "edcore").unwrap(), "EC-22");
        assert!(has_display_id(&issues[0]));
    }

    #[test]
    fn legacy_unparsable_fields_are_ignored() {
        let issues = vec![issue("k1", AppKey::EdCore, Some("imported-from-sheet"), false)];
        assert_eq!(next_display_id(&issues, "edcore").unwrap(), "EC-1");
        assert!(!has_display_id(&issues[0]));
    }

    #[test]
    fn sequence_draws_consecutive_identifiers() {
        let issues = vec![issue("k1", AppKey::EdCore, Some("EC-7"), false)];
        let mut seq = DisplayIdSequence::seeded(&issues, AppKey::EdCore);
        assert_eq!(seq.next_id(), "EC-8");
        assert_eq!(seq.next_id(), "EC-9");
        assert_eq!(seq.next_id(), "EC-10");
    }
}
