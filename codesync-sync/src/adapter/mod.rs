//! Per-kind resource adapters.
//!
//! An adapter owns everything that differs between resource kinds: how
//! resources are laid out and discovered, identity derivation, default
//! field values, and pre-flight validation. The orchestrator selects one
//! adapter per kind with [`adapter_for`] and never branches on kind itself.

mod bundle;
mod script;

pub use bundle::{ComponentAdapter, PluginAdapter};
pub use script::{ClassAdapter, FunctionAdapter, SCRIPT_EXTENSION};

use crate::error::SyncResult;
use crate::payload::ResourceDescriptor;
use crate::remote::{RemoteService, Violation};
use crate::source::ContentSource;
use async_trait::async_trait;
use codesync_manifest::ManifestEntry;
use codesync_types::{ResourceKey, ResourceKind};

/// Where a resource lives inside a content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    /// Raw name the identifier is derived from (directory name or file stem).
    pub name: String,
    /// Source path: the bundle directory, or the script file.
    pub path: String,
}

/// Kind-specific fallbacks for descriptor fields the manifest does not set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDefaults {
    pub namespace: &'static str,
    pub return_type: &'static str,
    pub binding_target: &'static str,
}

impl FieldDefaults {
    /// Picks the manifest's value when non-empty, the default otherwise.
    fn resolve(prior: Option<&str>, default: &str) -> String {
        prior
            .filter(|value| !value.is_empty())
            .unwrap_or(default)
            .to_string()
    }

    /// Builds a descriptor, preferring values from the prior manifest entry.
    pub fn descriptor(
        &self,
        key: &ResourceKey,
        location: &ResourceLocation,
        prior: Option<&ManifestEntry>,
        content: Option<String>,
    ) -> ResourceDescriptor {
        ResourceDescriptor {
            api_name: key.api_name().to_string(),
            name: Self::resolve(prior.map(|p| p.name.as_str()), &location.name),
            kind: key.kind(),
            content,
            namespace: Self::resolve(prior.map(|p| p.namespace.as_str()), self.namespace),
            return_type: Self::resolve(prior.map(|p| p.return_type.as_str()), self.return_type),
            binding_target: Self::resolve(
                prior.map(|p| p.binding_target.as_str()),
                self.binding_target,
            ),
            lang: prior.map(|p| p.lang).unwrap_or(0),
        }
    }
}

/// Kind-specific behavior of the push pipeline.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    /// The kind this adapter handles.
    fn kind(&self) -> ResourceKind;

    /// Fallback field values.
    fn defaults(&self) -> FieldDefaults {
        FieldDefaults::default()
    }

    /// Derives the resource key from its location.
    fn resource_key(&self, location: &ResourceLocation) -> SyncResult<ResourceKey> {
        Ok(ResourceKey::from_name(self.kind(), &location.name)?)
    }

    /// Builds a location from an explicit path (`--file`).
    fn location_from_path(&self, path: &str) -> ResourceLocation;

    /// Lists every resource of this kind under `root`, sorted by name.
    async fn discover(
        &self,
        source: &dyn ContentSource,
        root: &str,
    ) -> SyncResult<Vec<ResourceLocation>>;

    /// Resolves a resource by name under `root`.
    async fn locate(
        &self,
        source: &dyn ContentSource,
        root: &str,
        name: &str,
    ) -> SyncResult<ResourceLocation>;

    /// Builds the descriptor sent to the pre-flight calls and merged into the
    /// push request.
    async fn describe(
        &self,
        key: &ResourceKey,
        prior: Option<&ManifestEntry>,
        source: &dyn ContentSource,
        location: &ResourceLocation,
    ) -> SyncResult<ResourceDescriptor>;

    /// Runs pre-flight validation. Returns advisory findings; fatal ones are
    /// [`SyncError::ValidationFailed`](crate::SyncError::ValidationFailed).
    async fn preflight(
        &self,
        _remote: &dyn RemoteService,
        _descriptor: &ResourceDescriptor,
    ) -> SyncResult<Vec<Violation>> {
        Ok(Vec::new())
    }
}

/// Returns the adapter for `kind`.
pub fn adapter_for(kind: ResourceKind) -> Box<dyn ResourceAdapter> {
    match kind {
        ResourceKind::Component => Box::new(ComponentAdapter),
        ResourceKind::Plugin => Box::new(PluginAdapter),
        ResourceKind::Function => Box::new(FunctionAdapter),
        ResourceKind::Class => Box::new(ClassAdapter),
    }
}
