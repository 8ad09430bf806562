//! Caller identity and the administrative pre-check.
//!
//! Opsdeck does not do session handling; callers arrive already
//! authenticated and the only policy enforced here is "corrective
//! mutations require an administrative role", checked before any store
//! read or write happens.

use crate::error::{Error, Result};

/// Role a caller holds within the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// May run corrective mutations (repair, backfill, import).
    Admin,

    /// May report and browse issues.
    Member,
}

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct Caller {
    /// Stable actor identifier (username or service account).
    pub actor: String,

    /// Role the caller holds.
    pub role: Role,
}

impl Caller {
    /// Construct an admin caller.
    pub fn admin(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            role: Role::Admin,
        }
    }

    /// Construct a non-admin caller.
    pub fn member(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            role: Role::Member,
        }
    }
}

/// Require the administrative role for a named action.
///
/// # Errors
///
/// Returns [`Error::PermissionDenied`] before any read or write occurs
/// when the caller is not an admin.
pub fn require_admin(caller: &Caller, action: &'static str) -> Result<()> {
    match caller.role {
        Role::Admin => Ok(()),
        Role::Member => Err(Error::PermissionDenied {
            actor: caller.actor.clone(),
            action,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_passes_precheck() {
        assert!(require_admin(&Caller::admin("alice"), "repair identifiers").is_ok());
    }

    #[test]
    fn member_is_rejected_with_action_context() {
        let err = require_admin(&Caller::member("mallory"), "repair identifiers").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("mallory"));
        assert!(msg.contains("repair identifiers"));
    }
}
