//! The issue identity subsystem.
//!
//! Display identifiers (`EC-42`) are durable, human-readable, and
//! monotonically increasing per app prefix, assigned without a central
//! atomic counter. The store offers no "next sequence number" primitive,
//! so the subsystem derives the current maximum from a full-collection
//! scan every time it needs one, accepts that concurrent writers can race
//! to the same number, and repairs collisions after the fact.
//!
//! The pieces:
//!
//! - [`parse`] extracts `(app, suffix)` pairs from whatever identifier
//!   field a record happens to carry.
//! - [`allocator`] computes the next unused number for a prefix; pure.
//! - [`backfill`] plans identifiers for records created through a path
//!   that skipped allocation entirely.
//! - [`repair`] plans reassignments for identifier collisions, keeping
//!   the earliest-created record in each colliding group.
//! - [`import`] normalizes bulk rows and seeds the allocator once for the
//!   whole batch.
//! - [`service`] wires the pure planners to the store, the admin
//!   pre-check, and the audit trail: scan, plan, one atomic batch.
//!
//! Planning is deliberately separated from IO so every allocation rule is
//! testable on a plain `Vec<Issue>`.

pub mod allocator;
pub mod backfill;
pub mod import;
pub mod parse;
pub mod repair;
pub mod service;

pub use allocator::{DisplayIdSequence, next_display_id};
pub use backfill::{BackfillAssignment, plan_backfill};
pub use import::{ImportRow, MAX_IMPORT_ROWS};
pub use parse::{ParsedDisplayId, effective_display_id, global_max_suffix, parse_display_id};
pub use repair::{RepairPlan, plan_repair};
pub use service::{IdentityService, ImportOutcome, RepairOutcome};
