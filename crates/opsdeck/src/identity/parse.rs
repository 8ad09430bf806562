//! Display identifier parsing and scan helpers.

use crate::domain::{AppKey, Issue};

/// A display identifier split into its namespace and numeric suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDisplayId {
    /// The app the prefix belongs to.
    pub app: AppKey,

    /// The numeric suffix.
    pub suffix: u64,
}

impl ParsedDisplayId {
    /// Render back to the canonical `<PREFIX>-<N>` form.
    pub fn render(self) -> String {
        format!("{}-{}", self.app.prefix(), self.suffix)
    }
}

/// Parse a `<PREFIX>-<N>` display identifier against the app registry.
///
/// The suffix must be all ASCII digits; anything else (missing hyphen,
/// unknown prefix, signs, trailing junk) is not an identifier.
pub fn parse_display_id(raw: &str) -> Option<ParsedDisplayId> {
    let (prefix, digits) = raw.split_once('-')?;
    let app = AppKey::from_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let suffix = digits.parse::<u64>().ok()?;
    Some(ParsedDisplayId { app, suffix })
}

/// The identifier a record effectively carries, if any.
///
/// Checks the display field (which already absorbs the legacy `issueId` /
/// `issue_id` spellings at deserialization) and falls back to an
/// identifier-shaped storage key, which some ancient import paths used as
/// the document key itself. Every scan in this subsystem goes through this
/// one extraction so allocation, backfill, and repair agree on what
/// "has an identifier" means.
pub fn effective_display_id(issue: &Issue) -> Option<ParsedDisplayId> {
    if let Some(display_id) = issue.display_id.as_deref() {
        if let Some(parsed) = parse_display_id(display_id) {
            return Some(parsed);
        }
    }
    parse_display_id(issue.id.as_str())
}

/// Maximum numeric suffix observed across every record, all prefixes,
/// soft-deleted included. Zero when no record carries an identifier.
///
/// Deleted records are intentionally included: a suffix that was ever
/// observed in the collection is never reused.
pub fn global_max_suffix(issues: &[Issue]) -> u64 {
    issues
        .iter()
        .filter_map(effective_display_id)
        .map(|parsed| parsed.suffix)
        .max()
        .unwrap_or(0)
}

/// Maximum numeric suffix observed for one app, soft-deleted included.
pub fn max_suffix_for(issues: &[Issue], app: AppKey) -> u64 {
    issues
        .iter()
        .filter_map(effective_display_id)
        .filter(|parsed| parsed.app == app)
        .map(|parsed| parsed.suffix)
        .max()
        .unwrap_or(0)
}
