//! Component and plugin adapters.
//!
//! A bundle is a directory holding the kind's metadata document plus its
//! file buckets. The document itself is the payload; there is no
//! pre-flight analysis.

use super::{ResourceAdapter, ResourceLocation};
use crate::error::{SyncError, SyncResult};
use crate::payload::ResourceDescriptor;
use crate::source::{file_name, join_path, ContentSource};
use async_trait::async_trait;
use codesync_manifest::ManifestEntry;
use codesync_types::{ResourceKey, ResourceKind};
use tracing::debug;

async fn discover_bundles(
    kind: ResourceKind,
    source: &dyn ContentSource,
    root: &str,
) -> SyncResult<Vec<ResourceLocation>> {
    let Some(document) = kind.metadata_document() else {
        return Ok(Vec::new());
    };

    let mut found = Vec::new();
    for entry in source.list_dir(root).await? {
        if !entry.is_dir {
            continue;
        }
        if source.is_file(&join_path(&entry.path, document)).await? {
            found.push(ResourceLocation {
                name: entry.name,
                path: entry.path,
            });
        } else {
            debug!("Skipping {}: no {}", entry.path, document);
        }
    }
    Ok(found)
}

async fn locate_bundle(
    kind: ResourceKind,
    source: &dyn ContentSource,
    root: &str,
    name: &str,
) -> SyncResult<ResourceLocation> {
    let path = join_path(root, name);
    if source.list_dir(&path).await?.is_empty() {
        return Err(SyncError::PreconditionFailed(format!(
            "no {kind} directory {path} in {}",
            source.describe()
        )));
    }
    Ok(ResourceLocation {
        name: name.to_string(),
        path,
    })
}

fn bundle_location(path: &str) -> ResourceLocation {
    let path = path.trim_end_matches('/');
    ResourceLocation {
        name: file_name(path).to_string(),
        path: path.to_string(),
    }
}

/// UI component bundles (`component.xml`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentAdapter;

#[async_trait]
impl ResourceAdapter for ComponentAdapter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Component
    }

    fn location_from_path(&self, path: &str) -> ResourceLocation {
        bundle_location(path)
    }

    async fn discover(
        &self,
        source: &dyn ContentSource,
        root: &str,
    ) -> SyncResult<Vec<ResourceLocation>> {
        discover_bundles(self.kind(), source, root).await
    }

    async fn locate(
        &self,
        source: &dyn ContentSource,
        root: &str,
        name: &str,
    ) -> SyncResult<ResourceLocation> {
        locate_bundle(self.kind(), source, root, name).await
    }

    async fn describe(
        &self,
        key: &ResourceKey,
        prior: Option<&ManifestEntry>,
        _source: &dyn ContentSource,
        location: &ResourceLocation,
    ) -> SyncResult<ResourceDescriptor> {
        Ok(self.defaults().descriptor(key, location, prior, None))
    }
}

/// UI plugin bundles (`plugin.xml`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PluginAdapter;

#[async_trait]
impl ResourceAdapter for PluginAdapter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Plugin
    }

    fn location_from_path(&self, path: &str) -> ResourceLocation {
        bundle_location(path)
    }

    async fn discover(
        &self,
        source: &dyn ContentSource,
        root: &str,
    ) -> SyncResult<Vec<ResourceLocation>> {
        discover_bundles(self.kind(), source, root).await
    }

    async fn locate(
        &self,
        source: &dyn ContentSource,
        root: &str,
        name: &str,
    ) -> SyncResult<ResourceLocation> {
        locate_bundle(self.kind(), source, root, name).await
    }

    async fn describe(
        &self,
        key: &ResourceKey,
        prior: Option<&ManifestEntry>,
        _source: &dyn ContentSource,
        location: &ResourceLocation,
    ) -> SyncResult<ResourceDescriptor> {
        Ok(self.defaults().descriptor(key, location, prior, None))
    }
}
