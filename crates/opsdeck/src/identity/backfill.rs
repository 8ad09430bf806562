//! Backfill planning for records that have no identifier at all.
//!
//! Some creation paths (old serverless handlers, manual console inserts)
//! skipped allocation entirely. The backfill pass finds every record with
//! no parsable identifier anywhere (display field, legacy spellings, or
//! identifier-shaped storage key) and assigns consecutive numbers from a
//! single shared counter.
//!
//! Ordering choice: candidates are assigned in creation-time ascending
//! order, tie-broken by document key. Any stable order would satisfy the
//! contract; creation order makes the numbering follow the history an
//! operator expects.

use super::parse::{effective_display_id, global_max_suffix};
use crate::domain::{DocKey, Issue};

/// One planned backfill assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillAssignment {
    /// Document key of the record being assigned.
    pub key: DocKey,

    /// The identifier to write.
    pub display_id: String,
}

/// Plan identifier assignments for every record missing one.
///
/// `issues` must be the unfiltered full-collection scan. The shared
/// counter is seeded once at `global_max + 1` across all prefixes, so the
/// plan can never collide with any observed suffix; each assignment is
/// formatted with the record's own app prefix. Returns an empty plan when
/// nothing is missing.
pub fn plan_backfill(issues: &[Issue]) -> Vec<BackfillAssignment> {
    let mut missing: Vec<&Issue> = issues
        .iter()
        .filter(|issue| effective_display_id(issue).is_none())
        .collect();

    missing.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut next_suffix = global_max_suffix(issues) + 1;
    missing
        .into_iter()
        .map(|issue| {
            let display_id = format!("{}-{}", issue.app.prefix(), next_suffix);
            next_suffix += 1;
            BackfillAssignment {
                key: issue.id.clone(),
                display_id,
            }
        })
        .collect()
}
