//! Configuration for the sync engine.
//!
//! Loaded from a single JSON document; every section and field has a
//! default so a partial (or absent) file is valid.

use crate::error::{SyncError, SyncResult};
use codesync_types::ResourceKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "codesync.json";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub service: ServiceConfig,
    pub retry: RetryConfig,
    pub workspace: WorkspaceConfig,
    pub git: GitSourceConfig,
}

impl SyncConfig {
    /// Parses a JSON config document.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        serde_json::from_str(json).map_err(|e| SyncError::Config(format!("invalid config: {e}")))
    }

    /// Loads config from `path`, falling back to defaults when the file does
    /// not exist.
    pub fn load(path: &Path) -> SyncResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(SyncError::Config(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    /// Applies `CODESYNC_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("CODESYNC_BASE_URL") {
            self.service.base_url = url;
        }
        if let Some(token) = lookup("CODESYNC_TOKEN") {
            self.service.token = Some(token);
        }
        if let Some(tenant) = lookup("CODESYNC_TENANT") {
            self.service.tenant_id = tenant;
        }
        if let Some(token) = lookup("CODESYNC_GIT_TOKEN") {
            self.git.token = Some(token);
        }
        self
    }
}

/// Remote service endpoint and identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the remote service (e.g. `https://paas.example.com`).
    pub base_url: String,
    /// Bearer token. Never written back to disk by this crate.
    pub token: Option<String>,
    /// Tenant the resources belong to.
    pub tenant_id: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl ServiceConfig {
    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            token: None,
            tenant_id: String::new(),
            timeout_secs: 60,
        }
    }
}

/// Conflict-recovery retry bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum resubmissions after the first attempt.
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 2 }
    }
}

/// Local workspace layout. Directories are relative to the content source
/// root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Path of the local manifest file.
    pub manifest_path: String,
    pub components_dir: String,
    pub plugins_dir: String,
    pub functions_dir: String,
    pub classes_dir: String,
}

impl WorkspaceConfig {
    /// Returns the root directory holding resources of `kind`.
    pub fn root_for(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Component => &self.components_dir,
            ResourceKind::Plugin => &self.plugins_dir,
            ResourceKind::Function => &self.functions_dir,
            ResourceKind::Class => &self.classes_dir,
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            manifest_path: codesync_manifest::MANIFEST_FILE_NAME.to_string(),
            components_dir: "components".to_string(),
            plugins_dir: "plugins".to_string(),
            functions_dir: "functions".to_string(),
            classes_dir: "classes".to_string(),
        }
    }
}

/// Git-hosted repository used by the remote-source push.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSourceConfig {
    /// Base URL of the host's REST API (e.g. `https://api.github.com`).
    pub api_base_url: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Manifest path inside the repository.
    pub manifest_path: String,
    /// Initial token; replaced in memory when the host rejects it.
    pub token: Option<String>,
    /// How many times to prompt for a new token on 401/403.
    pub max_auth_prompts: u32,
    /// Local file that mirrors manifest updates made during a repository
    /// push. Empty disables mirroring.
    pub manifest_mirror: String,
}

impl GitSourceConfig {
    /// Fails when the repository coordinates are incomplete.
    pub fn validate(&self) -> SyncResult<()> {
        if self.owner.is_empty() || self.repo.is_empty() {
            return Err(SyncError::Config(
                "git.owner and git.repo are required for repository pushes".into(),
            ));
        }
        if self.branch.is_empty() {
            return Err(SyncError::Config("git.branch is required".into()));
        }
        Ok(())
    }
}

impl Default for GitSourceConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            owner: String::new(),
            repo: String::new(),
            branch: "main".to_string(),
            manifest_path: codesync_manifest::MANIFEST_FILE_NAME.to_string(),
            token: None,
            max_auth_prompts: 3,
            manifest_mirror: String::new(),
        }
    }
}
