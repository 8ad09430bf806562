//! Collision repair planning.
//!
//! The allocator is race-prone on purpose: two creations between scans
//! can mint the same number. This pass finds the resulting collisions and
//! plans reassignments so the collection converges back to uniqueness.
//!
//! Duplicate groups are keyed by `(prefix, suffix)`: the uniqueness
//! invariant is per prefix, so `EC-7` and `TL-7` are not duplicates of
//! each other. Replacement suffixes are still drawn from one global
//! counter seeded at `global_max + 1` (computed once, across every record
//! including soft-deleted ones, before any reassignment), so replacements
//! can never collide with each other or with anything observed.

use super::parse::{effective_display_id, global_max_suffix};
use crate::domain::{AppKey, DocKey, Issue};
use std::collections::BTreeMap;

/// One planned identifier reassignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    /// Document key of the record losing its identifier.
    pub key: DocKey,

    /// The colliding identifier it currently carries.
    pub old_display_id: String,

    /// The freshly allocated replacement.
    pub new_display_id: String,
}

/// The full repair plan for one invocation.
#[derive(Debug, Clone, Default)]
pub struct RepairPlan {
    /// Reassignments to commit as one atomic batch.
    pub reassignments: Vec<Reassignment>,

    /// Human-readable audit line per reassignment, or a single no-op line.
    pub log: Vec<String>,
}

/// Plan reassignments for every display identifier collision.
///
/// Only live (non-deleted) records participate in duplicate detection:
/// the invariant is uniqueness among live identifiers. Within a group,
/// members are ordered by creation time (key as tiebreaker); the earliest
/// keeps its identifier and every later member is reassigned.
///
/// Re-running against a collection with no duplicates yields an empty
/// plan with a "no duplicates found" log line, which is what makes the
/// repair idempotent.
pub fn plan_repair(issues: &[Issue]) -> RepairPlan {
    // BTreeMap keeps group iteration deterministic across runs
    let mut groups: BTreeMap<(AppKey, u64), Vec<&Issue>> = BTreeMap::new();
    for issue in issues.iter().filter(|issue| !issue.deleted) {
        if let Some(parsed) = effective_display_id(issue) {
            groups
                .entry((parsed.app, parsed.suffix))
                .or_default()
                .push(issue);
        }
    }

    // Seeded once across the whole scan, not per group
    let mut next_suffix = global_max_suffix(issues) + 1;

    let mut plan = RepairPlan::default();
    for ((app, suffix), mut members) in groups {
        if members.len() < 2 {
            continue;
        }

        members.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let old_display_id = format!("{}-{}", app.prefix(), suffix);
        for (duplicate_index, member) in members.iter().enumerate().skip(1) {
            let new_display_id = format!("{}-{}", app.prefix(), next_suffix);
            next_suffix += 1;

            plan.log.push(format!(
                "{old_display_id} (duplicate #{duplicate_index}) -> {new_display_id}"
            ));
            plan.reassignments.push(Reassignment {
                key: member.id.clone(),
                old_display_id: old_display_id.clone(),
                new_display_id,
            });
        }
    }

    if plan.reassignments.is_empty() {
        plan.log.push("no duplicates found".to_string());
    }

    plan
}
