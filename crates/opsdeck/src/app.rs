//! Application context for CLI command execution.
//!
//! Wires the storage backend, the audit sink, the caller identity, and
//! the user directory together from the workspace configuration.

use crate::audit::{AuditSink, JsonlAuditSink};
use crate::auth::{Caller, Role};
use crate::commands::init::{
    CONFIG_FILE_NAME, OPSDECK_DIR_NAME, OpsdeckConfig, find_opsdeck_root,
};
use crate::error::{Error, Result};
use crate::identity::IdentityService;
use crate::storage::{IssueStore, create_store};
use crate::triage::StaticDirectory;
use std::path::{Path, PathBuf};

/// Environment variable carrying the acting user when `--actor` is absent.
pub const ACTOR_ENV_VAR: &str = "OPSDECK_ACTOR";

/// Application context for CLI operations.
pub struct App {
    /// The storage backend (trait object for polymorphism).
    storage: Box<dyn IssueStore>,

    /// The audit sink mutations append to.
    audit: Box<dyn AuditSink>,

    /// Path to the opsdeck directory (`.opsdeck`).
    opsdeck_dir: PathBuf,

    /// Loaded workspace configuration.
    config: OpsdeckConfig,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("opsdeck_dir", &self.opsdeck_dir)
            .field("default_app", &self.config.default_app)
            .field("storage", &"<dyn IssueStore>")
            .finish()
    }
}

impl App {
    /// Create an App instance from the given working directory.
    ///
    /// Searches up the directory tree for a `.opsdeck/` directory, loads
    /// configuration, and initializes storage and the audit sink.
    ///
    /// # Errors
    ///
    /// Returns an error if no workspace is found, configuration cannot be
    /// loaded, or storage initialization fails.
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_opsdeck_root(working_dir).ok_or_else(|| {
            Error::Config("not an opsdeck workspace (run 'opsdeck init' first)".to_string())
        })?;

        let opsdeck_dir = root_dir.join(OPSDECK_DIR_NAME);
        let config = OpsdeckConfig::load(&opsdeck_dir.join(CONFIG_FILE_NAME)).await?;

        let backend = config.storage.to_backend(&root_dir)?;
        let storage = create_store(backend).await?;
        let audit = Box::new(JsonlAuditSink::new(root_dir.join(&config.audit_file)));

        Ok(Self {
            storage,
            audit,
            opsdeck_dir,
            config,
        })
    }

    /// Get an immutable reference to the storage.
    pub fn storage(&self) -> &dyn IssueStore {
        self.storage.as_ref()
    }

    /// Get a mutable reference to the storage.
    pub fn storage_mut(&mut self) -> &mut dyn IssueStore {
        self.storage.as_mut()
    }

    /// Borrow an identity service over this app's storage and audit sink.
    pub fn identity(&mut self) -> IdentityService<'_> {
        IdentityService::new(self.storage.as_mut(), self.audit.as_ref())
    }

    /// Resolve the acting caller.
    ///
    /// The actor comes from the `--actor` flag, then the `OPSDECK_ACTOR`
    /// environment variable, then falls back to `anonymous`. The role is
    /// administrative exactly when the actor is in the config `admins`
    /// list.
    pub fn caller(&self, actor_flag: Option<&str>) -> Caller {
        let actor = actor_flag
            .map(str::to_string)
            .or_else(|| std::env::var(ACTOR_ENV_VAR).ok())
            .unwrap_or_else(|| "anonymous".to_string());
        let role = if self.config.admins.iter().any(|admin| admin == &actor) {
            Role::Admin
        } else {
            Role::Member
        };
        Caller { actor, role }
    }

    /// The user directory from the config `users` map.
    pub fn directory(&self) -> StaticDirectory {
        StaticDirectory::new(self.config.users.clone())
    }

    /// The configured default app key.
    pub fn default_app(&self) -> &str {
        &self.config.default_app
    }

    /// Path to the opsdeck directory.
    pub fn opsdeck_dir(&self) -> &Path {
        &self.opsdeck_dir
    }

    /// Save storage state to persistent storage.
    ///
    /// Called after any mutating command.
    pub async fn save(&self) -> Result<()> {
        self.storage.save().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init;
    use tempfile::TempDir;

    #[tokio::test]
    async fn app_loads_from_initialized_directory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), Some("pulse")).await.unwrap();

        let app = App::from_directory(temp_dir.path()).await.unwrap();

        assert_eq!(app.default_app(), "pulse");
        assert!(app.opsdeck_dir().ends_with(".opsdeck"));
    }

    #[tokio::test]
    async fn app_resolves_roles_from_admin_list() {
        let temp_dir = TempDir::new().unwrap();
        let result = init::init(temp_dir.path(), None).await.unwrap();

        let mut config = OpsdeckConfig::load(&result.config_file).await.unwrap();
        config.admins.push("alice".to_string());
        config.save(&result.config_file).await.unwrap();

        let app = App::from_directory(temp_dir.path()).await.unwrap();
        assert_eq!(app.caller(Some("alice")).role, Role::Admin);
        assert_eq!(app.caller(Some("mallory")).role, Role::Member);
    }

    #[tokio::test]
    async fn app_from_uninitialized_directory_fails() {
        let temp_dir = TempDir::new().unwrap();

        let result = App::from_directory(temp_dir.path()).await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("not an opsdeck workspace"));
    }
}
