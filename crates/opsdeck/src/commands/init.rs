//! Implementation of the `init` command.
//!
//! Initializes an opsdeck workspace: the `.opsdeck/` directory with the
//! YAML configuration, the empty issue collection, and the empty audit
//! log.

use crate::domain::AppKey;
use crate::error::{Error, Result};
use crate::storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the opsdeck directory.
pub const OPSDECK_DIR_NAME: &str = ".opsdeck";

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the issue collection file.
pub const ISSUES_FILE_NAME: &str = "issues.jsonl";

/// Name of the audit log file.
pub const AUDIT_FILE_NAME: &str = "audit.jsonl";

/// Name of the gitignore file within `.opsdeck`.
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Maximum directory depth to traverse when searching for the workspace root.
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Configuration file structure for opsdeck.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpsdeckConfig {
    /// App key used when a command does not name one.
    #[serde(rename = "default-app")]
    pub default_app: String,

    /// Storage configuration.
    pub storage: StorageConfig,

    /// Path to the audit log, relative to the workspace root.
    #[serde(default = "default_audit_file")]
    pub audit_file: String,

    /// Actors holding the administrative role.
    #[serde(default)]
    pub admins: Vec<String>,

    /// User directory: raw user id to display name.
    #[serde(default)]
    pub users: BTreeMap<String, String>,
}

/// Storage configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Storage backend type (`memory` = in-memory with JSONL persistence).
    pub backend: String,

    /// Path to the collection file, relative to the workspace root.
    pub data_file: String,
}

fn default_audit_file() -> String {
    format!("{OPSDECK_DIR_NAME}/{AUDIT_FILE_NAME}")
}

impl OpsdeckConfig {
    /// Create a new configuration with the given default app.
    pub fn new(default_app: &str) -> Self {
        Self {
            default_app: default_app.to_string(),
            storage: StorageConfig {
                backend: "memory".to_string(),
                data_file: format!("{OPSDECK_DIR_NAME}/{ISSUES_FILE_NAME}"),
            },
            audit_file: default_audit_file(),
            admins: Vec::new(),
            users: BTreeMap::new(),
        }
    }

    /// Load configuration from a file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save configuration to a file.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }
}

impl StorageConfig {
    /// Resolve the configured backend against the workspace root.
    pub fn to_backend(&self, root: &Path) -> Result<StorageBackend> {
        match self.backend.as_str() {
            "memory" | "jsonl" => Ok(StorageBackend::Jsonl(root.join(&self.data_file))),
            other => Err(Error::Config(format!("unknown storage backend '{other}'"))),
        }
    }
}

impl Default for OpsdeckConfig {
    fn default() -> Self {
        Self::new(AppKey::EdCore.key())
    }
}

/// Result of the init command.
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created opsdeck directory.
    pub opsdeck_dir: PathBuf,
    /// Path to the created config file.
    pub config_file: PathBuf,
    /// Path to the created issue collection file.
    pub issues_file: PathBuf,
    /// Path to the created audit log file.
    pub audit_file: PathBuf,
    /// The default app key configured.
    pub default_app: String,
}

/// Initialize a new opsdeck workspace in the given directory.
///
/// # Errors
///
/// Returns an error if the workspace is already initialized, the app key
/// is not in the registry, or file system operations fail.
pub async fn init(base_dir: &Path, default_app: Option<&str>) -> Result<InitResult> {
    let default_app = default_app.unwrap_or(AppKey::EdCore.key()).trim();

    if AppKey::from_key(default_app).is_none() {
        return Err(Error::InvalidArgument(format!(
            "unknown app key '{default_app}' (registered: {})",
            AppKey::ALL
                .iter()
                .map(|a| a.key())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let opsdeck_dir = base_dir.join(OPSDECK_DIR_NAME);
    if opsdeck_dir.exists() {
        return Err(Error::Config(format!(
            "opsdeck is already initialized here, found existing '{OPSDECK_DIR_NAME}'"
        )));
    }

    fs::create_dir_all(&opsdeck_dir).await?;

    let config_file = opsdeck_dir.join(CONFIG_FILE_NAME);
    let config = OpsdeckConfig::new(default_app);
    config.save(&config_file).await?;

    let issues_file = opsdeck_dir.join(ISSUES_FILE_NAME);
    fs::write(&issues_file, "").await?;

    let audit_file = opsdeck_dir.join(AUDIT_FILE_NAME);
    fs::write(&audit_file, "").await?;

    let gitignore_file = opsdeck_dir.join(GITIGNORE_FILE_NAME);
    let gitignore_content = "\
# The issues.jsonl collection is tracked for collaboration.
# The audit log stays local.
audit.jsonl
";
    fs::write(&gitignore_file, gitignore_content).await?;

    Ok(InitResult {
        opsdeck_dir,
        config_file,
        issues_file,
        audit_file,
        default_app: default_app.to_string(),
    })
}

/// Find the workspace root by searching up the directory tree.
///
/// Returns the directory containing `.opsdeck/`, or `None` if no
/// workspace is found within the depth limit.
pub fn find_opsdeck_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(OPSDECK_DIR_NAME).exists() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_creates_directory_structure() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), None).await.unwrap();

        assert!(result.opsdeck_dir.exists());
        assert!(result.config_file.exists());
        assert!(result.issues_file.exists());
        assert!(result.audit_file.exists());
        assert_eq!(result.default_app, "edcore");
    }

    #[tokio::test]
    async fn init_rejects_unknown_app_key() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), Some("storefront")).await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(!temp_dir.path().join(OPSDECK_DIR_NAME).exists());
    }

    #[tokio::test]
    async fn init_fails_if_already_initialized() {
        let temp_dir = TempDir::new().unwrap();

        init(temp_dir.path(), None).await.unwrap();
        let result = init(temp_dir.path(), Some("pulse")).await;

        assert!(result.is_err());
        let msg = result.unwrap_err().to_string().to_lowercase();
        assert!(msg.contains("already initialized"));
    }

    #[tokio::test]
    async fn config_round_trips_through_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut original = OpsdeckConfig::new("pulse");
        original.admins.push("alice".to_string());
        original
            .users
            .insert("u_4931".to_string(), "Priya Sharma".to_string());
        original.save(&config_path).await.unwrap();

        let loaded = OpsdeckConfig::load(&config_path).await.unwrap();
        assert_eq!(original, loaded);
    }

    #[tokio::test]
    async fn config_yaml_uses_kebab_default_app() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        OpsdeckConfig::new("tutorlab").save(&config_path).await.unwrap();

        let content = tokio::fs::read_to_string(&config_path).await.unwrap();
        assert!(content.contains("default-app: tutorlab"));
        assert!(content.contains("backend: memory"));
    }

    #[test]
    fn unknown_backend_is_a_config_error() {
        let config = StorageConfig {
            backend: "postgres".to_string(),
            data_file: "x".to_string(),
        };
        assert!(matches!(
            config.to_backend(Path::new("/tmp")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn find_root_walks_up_the_tree() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join(OPSDECK_DIR_NAME)).unwrap();

        let sub_dir = temp_dir.path().join("sub").join("nested");
        std::fs::create_dir_all(&sub_dir).unwrap();

        assert_eq!(
            find_opsdeck_root(&sub_dir),
            Some(temp_dir.path().to_path_buf())
        );
        assert_eq!(find_opsdeck_root(&TempDir::new().unwrap().path().to_path_buf()), None);
    }
}
