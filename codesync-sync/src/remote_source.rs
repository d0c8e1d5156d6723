//! Pushing resources straight from a git-hosted repository.
//!
//! Same pipeline as a local push, with two substitutions: resource files are
//! read from the repository tree, and the manifest is the JSON document
//! committed in the repository rather than the local file.

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::git::GitHostClient;
use crate::orchestrator::{BatchReport, KindSelection, SyncOrchestrator};
use crate::remote::RemoteService;
use crate::source::GitTreeSource;
use codesync_manifest::{
    JsonManifestStore, ManifestEntry, ManifestMap, ManifestResult, ManifestStore,
    MemoryManifestStore,
};
use codesync_types::ResourceKey;
use std::sync::Arc;
use tracing::{info, warn};

/// Manifest fetched from the repository.
///
/// Updates made during the push live in memory; when a mirror is set they
/// are also written to a local manifest file.
#[derive(Debug, Default)]
pub struct RemoteManifest {
    inner: MemoryManifestStore,
    mirror: Option<JsonManifestStore>,
}

impl RemoteManifest {
    /// Fetches the manifest at the configured repository path. A missing or
    /// unparseable document yields an empty manifest.
    pub async fn fetch(client: &GitHostClient) -> SyncResult<Self> {
        let path = &client.config().manifest_path;
        let inner = match client.fetch_file(path).await? {
            Some(bytes) => Self::parse(path, &bytes),
            None => {
                info!("No manifest at {} in {}, starting empty", path, client.describe());
                MemoryManifestStore::new()
            }
        };
        Ok(Self {
            inner,
            mirror: None,
        })
    }

    /// Builds a manifest from an already-fetched document.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            inner: Self::parse("<memory>", bytes),
            mirror: None,
        }
    }

    fn parse(path: &str, bytes: &[u8]) -> MemoryManifestStore {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return MemoryManifestStore::new();
        }
        MemoryManifestStore::from_bytes(bytes).unwrap_or_else(|e| {
            warn!("Ignoring unreadable manifest {}: {}", path, e);
            MemoryManifestStore::new()
        })
    }

    /// Mirrors every update to a local manifest file.
    #[must_use]
    pub fn with_mirror(mut self, mirror: JsonManifestStore) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Serializes the in-memory document.
    pub fn to_json(&self) -> ManifestResult<String> {
        self.inner.to_json()
    }
}

impl ManifestStore for RemoteManifest {
    fn load(&self) -> ManifestMap {
        self.inner.load()
    }

    fn upsert(&mut self, key: &ResourceKey, entry: &ManifestEntry) -> ManifestResult<()> {
        self.inner.upsert(key, entry)?;
        if let Some(mirror) = self.mirror.as_mut() {
            mirror.upsert(key, entry)?;
        }
        Ok(())
    }
}

/// Pushes the selected kinds from the configured repository.
///
/// Fails only when the repository manifest cannot be fetched; per-resource
/// failures are reported in the batch.
pub async fn push_from_repository(
    remote: Arc<dyn RemoteService>,
    client: Arc<GitHostClient>,
    config: &SyncConfig,
    selection: KindSelection,
) -> SyncResult<BatchReport> {
    info!("Pushing from repository {}", client.describe());

    let mut manifest = RemoteManifest::fetch(&client).await?;
    if !config.git.manifest_mirror.is_empty() {
        manifest = manifest.with_mirror(JsonManifestStore::new(&config.git.manifest_mirror));
    }

    let source = GitTreeSource::new(Arc::clone(&client));
    let mut orchestrator = SyncOrchestrator::new(remote, Box::new(manifest), config.retry.max_retries)
        .with_tenant(config.service.tenant_id.clone());

    Ok(orchestrator
        .push_all(selection, &source, &config.workspace)
        .await)
}
