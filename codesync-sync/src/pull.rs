//! Pulling script resources from the service.

use crate::adapter::SCRIPT_EXTENSION;
use crate::error::{SyncError, SyncResult};
use crate::orchestrator::SyncOrchestrator;
use crate::remote::RemoteResource;
use codesync_manifest::ManifestEntry;
use codesync_types::{ResourceKey, ResourceKind, VersionStamp};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// A resource written to the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOutcome {
    pub key: ResourceKey,
    /// File the content was written to.
    pub path: PathBuf,
    pub version: VersionStamp,
}

impl SyncOrchestrator {
    /// Downloads a function or class into `root` and records its server
    /// version in the manifest. Bundles cannot be pulled.
    pub async fn pull(
        &mut self,
        kind: ResourceKind,
        name: &str,
        root: &Path,
    ) -> SyncResult<PullOutcome> {
        if kind.is_bundle() {
            return Err(SyncError::PreconditionFailed(format!(
                "pull is not supported for {kind} resources"
            )));
        }

        let stem = name
            .strip_suffix(&format!(".{SCRIPT_EXTENSION}"))
            .unwrap_or(name);
        let key = ResourceKey::from_name(kind, stem)?;
        let resource = self.remote.lookup(&key).await?.ok_or_else(|| {
            SyncError::PreconditionFailed(format!("{key} does not exist on the server"))
        })?;
        let content = resource.content.clone().ok_or_else(|| {
            SyncError::PreconditionFailed(format!("server returned no content for {key}"))
        })?;

        fs::create_dir_all(root).await?;
        let path = root.join(format!("{}.{SCRIPT_EXTENSION}", key.api_name()));
        fs::write(&path, content.as_bytes()).await?;

        let prior = self.manifest.lookup(&key);
        let entry = pulled_entry(prior, kind, resource, content, &self.tenant);
        let version = entry.version;
        self.manifest.upsert(&key, &entry)?;

        info!("Pulled {} at version {} into {}", key, version, path.display());
        Ok(PullOutcome { key, path, version })
    }
}

fn pulled_entry(
    prior: Option<ManifestEntry>,
    kind: ResourceKind,
    resource: RemoteResource,
    content: String,
    tenant: &str,
) -> ManifestEntry {
    let mut entry = prior.unwrap_or_default();
    entry.version = resource.version;
    entry.api_name = resource.api_name;
    entry.name = if resource.name.is_empty() {
        entry.api_name.clone()
    } else {
        resource.name
    };
    entry.content = content;
    entry.kind = kind.as_str().to_string();
    entry.namespace = resource.namespace;
    entry.return_type = resource.return_type;
    entry.binding_target = resource.binding_target;
    entry.lang = resource.lang;
    if !tenant.is_empty() {
        entry.tenant = tenant.to_string();
    }
    entry
}
