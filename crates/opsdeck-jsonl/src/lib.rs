//! JSONL document-file plumbing for opsdeck.
//!
//! The opsdeck document store keeps every collection in a JSON Lines file
//! that several writers may touch over time. This crate provides the three
//! operations the store needs from that file format:
//!
//! - **Resilient reads**: [`read_jsonl_resilient`] parses a whole file and
//!   keeps going past malformed lines, reporting them as [`Warning`]s
//!   instead of failing the load.
//! - **Atomic rewrites**: [`write_jsonl_atomic`] uses the
//!   temp-file-then-rename pattern so a crashed write never leaves the
//!   collection half-serialized.
//! - **Appends**: [`append_jsonl`] adds a single record to the end of a
//!   file, which is how the audit log grows.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{Error, Result};
pub use reader::{Warning, read_jsonl_resilient};
pub use writer::{append_jsonl, write_jsonl_atomic};
