//! Storage key generation for issue documents.
//!
//! Document keys are opaque: they carry no sequence or meaning, in contrast
//! to display identifiers. Keys are derived from a SHA-256 hash of the
//! record's content plus a timestamp and nonce, encoded in base36 at a
//! fixed width. Collisions against the loaded key set are detected and
//! retried with a fresh nonce.

use crate::domain::DocKey;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Fixed key width in characters. 36^10 key space makes accidental
/// collisions a retry-once event, not a design concern.
const KEY_LENGTH: usize = 10;

const MAX_NONCE: u32 = 64;

/// Errors that can occur during key generation.
#[derive(Debug, Error)]
pub enum DocKeyError {
    /// Unable to generate a unique key after exhausting all nonces.
    #[error("unable to generate unique document key after {attempts} attempts")]
    CollisionExhausted {
        /// Number of nonce attempts made.
        attempts: u32,
    },
}

/// Hash-based document key generator with collision detection.
///
/// Create one per operation, seeded with the keys already present in the
/// store, and let it go out of scope afterwards; there is no value in
/// keeping generator state across invocations.
pub struct DocKeyGenerator {
    existing: HashSet<String>,
}

impl DocKeyGenerator {
    /// Create a generator with no known keys.
    pub fn new() -> Self {
        Self {
            existing: HashSet::new(),
        }
    }

    /// Create a generator seeded with every key currently in the store.
    pub fn with_existing<'a>(keys: impl IntoIterator<Item = &'a DocKey>) -> Self {
        Self {
            existing: keys.into_iter().map(|k| k.as_str().to_string()).collect(),
        }
    }

    /// Register a key so later generations cannot collide with it.
    pub fn register(&mut self, key: &DocKey) {
        self.existing.insert(key.as_str().to_string());
    }

    /// Generate a new unique document key.
    ///
    /// # Errors
    ///
    /// Returns [`DocKeyError::CollisionExhausted`] if every nonce collides,
    /// which in practice indicates a corrupted key set.
    pub fn generate(&mut self, app: &str, title: &str) -> Result<DocKey, DocKeyError> {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();

        for nonce in 0..MAX_NONCE {
            let key = hash_key(app, title, timestamp, nonce);
            if !self.existing.contains(&key) {
                if nonce > 0 {
                    debug!(nonce, "generated document key after collision retries");
                }
                self.existing.insert(key.clone());
                return Ok(DocKey::new(key));
            }
        }

        Err(DocKeyError::CollisionExhausted {
            attempts: MAX_NONCE,
        })
    }
}

impl Default for DocKeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_key(app: &str, title: &str, timestamp: i64, nonce: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(app.as_bytes());
    hasher.update(b"|");
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(timestamp.to_be_bytes());
    hasher.update(nonce.to_be_bytes());
    let digest = hasher.finalize();

    encode_base36(&digest[..8])
}

/// Encode the first 8 hash bytes as a fixed-width base36 string.
///
/// The 8-byte slice fits a u64 exactly, so no wrapping arithmetic is
/// needed; the fixed width pads short values with leading zeros.
fn encode_base36(bytes: &[u8]) -> String {
    let mut num = 0u64;
    for &byte in bytes {
        num = (num << 8) | u64::from(byte);
    }

    let mut out = [0u8; KEY_LENGTH];
    for slot in out.iter_mut().rev() {
        *slot = BASE36_CHARS[(num % 36) as usize];
        num /= 36;
    }

    // KEY_LENGTH base36 digits always cover a u64 remainder, and the
    // alphabet is ASCII, so this cannot fail.
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_keys_have_fixed_width() {
        let key = hash_key("edcore", "Some title", 1_700_000_000, 0);
        assert_eq!(key.len(), KEY_LENGTH);
        assert!(key.bytes().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn generation_is_collision_checked() {
        let mut generator = DocKeyGenerator::new();
        let a = generator.generate("edcore", "Same title").unwrap();
        let b = generator.generate("edcore", "Same title").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn registered_keys_are_never_reissued() {
        let existing = DocKey::new("aaaaaaaaaa");
        let mut generator = DocKeyGenerator::with_existing([&existing]);
        generator.register(&DocKey::new("bbbbbbbbbb"));

        let key = generator.generate("pulse", "Fresh issue").unwrap();
        assert_ne!(key.as_str(), "aaaaaaaaaa");
        assert_ne!(key.as_str(), "bbbbbbbbbb");
    }

    #[test]
    fn encode_base36_pads_small_values() {
        let encoded = encode_base36(&[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(encoded.len(), KEY_LENGTH);
        assert!(encoded.starts_with('0'));
        assert!(encoded.ends_with('1'));
    }
}
