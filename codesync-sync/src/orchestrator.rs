//! Batch orchestration.
//!
//! Runs the per-resource pipeline (adapter, assembler, retry engine,
//! manifest update) over one resource or every resource of one or all
//! kinds. Resources are processed sequentially. A resource's failure is
//! recorded in its [`SyncOutcome`] and never stops the batch; there is no
//! rollback of resources already pushed.

use crate::adapter::{adapter_for, ResourceAdapter, ResourceLocation};
use crate::assembler::PayloadAssembler;
use crate::config::WorkspaceConfig;
use crate::error::SyncResult;
use crate::payload::{PushPayload, ResourceDescriptor};
use crate::remote::RemoteService;
use crate::retry::ConflictResolver;
use crate::source::ContentSource;
use codesync_manifest::{ManifestEntry, ManifestStore};
use codesync_types::{ResourceKey, ResourceKind, VersionStamp};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Which kinds a batch covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindSelection {
    One(ResourceKind),
    All,
}

impl KindSelection {
    /// Kinds in processing order.
    pub fn kinds(&self) -> Vec<ResourceKind> {
        match self {
            KindSelection::One(kind) => vec![*kind],
            KindSelection::All => ResourceKind::ALL.to_vec(),
        }
    }
}

/// Result of pushing one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub kind: ResourceKind,
    /// Resource name as the operator knows it (directory or file stem).
    pub name: String,
    /// `None` when the failure happened before identity was derived.
    pub key: Option<ResourceKey>,
    pub success: bool,
    /// The failure message, or a warning attached to a success (empty when
    /// there is none).
    pub message: String,
    /// Final version on success.
    pub version: Option<VersionStamp>,
}

impl SyncOutcome {
    fn succeeded(kind: ResourceKind, name: &str, key: ResourceKey, version: VersionStamp) -> Self {
        Self {
            kind,
            name: name.to_string(),
            key: Some(key),
            success: true,
            message: String::new(),
            version: Some(version),
        }
    }

    fn with_warning(mut self, warning: Option<String>) -> Self {
        self.message = warning.unwrap_or_default();
        self
    }

    fn failed(kind: ResourceKind, name: &str, key: Option<ResourceKey>, message: String) -> Self {
        Self {
            kind,
            name: name.to_string(),
            key,
            success: false,
            message,
            version: None,
        }
    }
}

/// Per-kind counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Aggregate result of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<SyncOutcome>,
}

impl BatchReport {
    pub fn push(&mut self, outcome: SyncOutcome) {
        self.outcomes.push(outcome);
    }

    /// Appends another report's outcomes.
    pub fn merge(&mut self, other: BatchReport) {
        self.outcomes.extend(other.outcomes);
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    /// True when nothing failed.
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// `(resource name, warning)` for every success that carries one.
    pub fn warnings(&self) -> Vec<(String, String)> {
        self.outcomes
            .iter()
            .filter(|o| o.success && !o.message.is_empty())
            .map(|o| (o.name.clone(), o.message.clone()))
            .collect()
    }

    /// `(resource name, message)` for every failure, in processing order.
    pub fn failures(&self) -> Vec<(String, String)> {
        self.outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| (o.name.clone(), o.message.clone()))
            .collect()
    }

    /// Counts per kind.
    pub fn by_kind(&self) -> BTreeMap<ResourceKind, KindSummary> {
        let mut summary: BTreeMap<ResourceKind, KindSummary> = BTreeMap::new();
        for outcome in &self.outcomes {
            let entry = summary.entry(outcome.kind).or_default();
            if outcome.success {
                entry.succeeded += 1;
            } else {
                entry.failed += 1;
            }
        }
        summary
    }
}

/// Drives pushes against one remote service and one manifest store.
pub struct SyncOrchestrator {
    pub(crate) remote: Arc<dyn RemoteService>,
    pub(crate) manifest: Box<dyn ManifestStore>,
    assembler: PayloadAssembler,
    resolver: ConflictResolver,
    pub(crate) tenant: String,
}

impl SyncOrchestrator {
    /// Creates an orchestrator. `max_retries` bounds conflict recovery.
    pub fn new(
        remote: Arc<dyn RemoteService>,
        manifest: Box<dyn ManifestStore>,
        max_retries: u32,
    ) -> Self {
        Self {
            assembler: PayloadAssembler::new(Arc::clone(&remote)),
            resolver: ConflictResolver::new(Arc::clone(&remote), max_retries),
            remote,
            manifest,
            tenant: String::new(),
        }
    }

    /// Sets the tenant id recorded in new manifest entries.
    #[must_use]
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = tenant.into();
        self
    }

    /// Returns the manifest store.
    pub fn manifest(&self) -> &dyn ManifestStore {
        self.manifest.as_ref()
    }

    /// Consumes the orchestrator, returning its manifest store.
    pub fn into_manifest(self) -> Box<dyn ManifestStore> {
        self.manifest
    }

    /// Pushes the resource at an explicit path (`--file`).
    pub async fn push_path(
        &mut self,
        kind: ResourceKind,
        path: &str,
        source: &dyn ContentSource,
    ) -> SyncOutcome {
        let adapter = adapter_for(kind);
        let location = adapter.location_from_path(path);
        self.push_location(adapter.as_ref(), source, &location).await
    }

    /// Pushes one resource by name from the kind's workspace directory.
    pub async fn push_named(
        &mut self,
        kind: ResourceKind,
        name: &str,
        source: &dyn ContentSource,
        workspace: &WorkspaceConfig,
    ) -> SyncOutcome {
        let adapter = adapter_for(kind);
        match adapter.locate(source, workspace.root_for(kind), name).await {
            Ok(location) => self.push_location(adapter.as_ref(), source, &location).await,
            Err(e) => {
                error!("{} {}: {}", kind, name, e);
                SyncOutcome::failed(kind, name, None, e.to_string())
            }
        }
    }

    /// Pushes every resource of one kind.
    pub async fn push_kind(
        &mut self,
        kind: ResourceKind,
        source: &dyn ContentSource,
        workspace: &WorkspaceConfig,
    ) -> BatchReport {
        let adapter = adapter_for(kind);
        let root = workspace.root_for(kind);
        let mut report = BatchReport::default();

        let locations = match adapter.discover(source, root).await {
            Ok(locations) => locations,
            Err(e) => {
                error!("Could not list {} resources in {}: {}", kind, root, e);
                report.push(SyncOutcome::failed(kind, root, None, e.to_string()));
                return report;
            }
        };

        info!("Found {} {} resource(s) in {}", locations.len(), kind, source.describe());
        for location in &locations {
            let outcome = self.push_location(adapter.as_ref(), source, location).await;
            report.push(outcome);
        }
        report
    }

    /// Pushes every resource of the selected kind(s).
    pub async fn push_all(
        &mut self,
        selection: KindSelection,
        source: &dyn ContentSource,
        workspace: &WorkspaceConfig,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for kind in selection.kinds() {
            report.merge(self.push_kind(kind, source, workspace).await);
        }
        info!(
            "Push finished: {} succeeded, {} failed",
            report.success_count(),
            report.failed_count()
        );
        report
    }

    /// Pushes one located resource, converting any failure into a failed
    /// outcome.
    pub async fn push_location(
        &mut self,
        adapter: &dyn ResourceAdapter,
        source: &dyn ContentSource,
        location: &ResourceLocation,
    ) -> SyncOutcome {
        let kind = adapter.kind();
        let key = match adapter.resource_key(location) {
            Ok(key) => key,
            Err(e) => {
                error!("{} {}: {}", kind, location.name, e);
                return SyncOutcome::failed(kind, &location.name, None, e.to_string());
            }
        };

        info!("Pushing {}", key);
        match self.push_resource(adapter, source, location, &key).await {
            Ok((version, warning)) => {
                info!("Pushed {} at version {}", key, version);
                SyncOutcome::succeeded(kind, &location.name, key, version).with_warning(warning)
            }
            Err(e) => {
                error!("Failed to push {}: {}", key, e);
                SyncOutcome::failed(kind, &location.name, Some(key), e.to_string())
            }
        }
    }

    async fn push_resource(
        &mut self,
        adapter: &dyn ResourceAdapter,
        source: &dyn ContentSource,
        location: &ResourceLocation,
        key: &ResourceKey,
    ) -> SyncResult<(VersionStamp, Option<String>)> {
        let prior = self.manifest.lookup(key);
        let version = prior.as_ref().map(|p| p.version).unwrap_or_default();

        let descriptor = adapter.describe(key, prior.as_ref(), source, location).await?;
        adapter.preflight(self.remote.as_ref(), &descriptor).await?;

        let payload = self
            .assembler
            .assemble(source, location, key, descriptor, version)
            .await?;
        let recorded = ManifestRecord::from_payload(&payload);

        let accepted = self.resolver.submit(payload).await?;
        if accepted.submissions > 1 {
            info!("{} accepted after {} submissions", key, accepted.submissions);
        }

        // The server holds this version now; a failed manifest write is a warning.
        let entry = recorded.into_entry(prior, accepted.version, &self.tenant);
        let warning = match self.manifest.upsert(key, &entry) {
            Ok(()) => None,
            Err(e) => {
                warn!("{} pushed but the manifest was not updated: {}", key, e);
                Some(format!(
                    "pushed at version {}, but the manifest was not updated: {e}",
                    accepted.version
                ))
            }
        };
        Ok((accepted.version, warning))
    }
}

/// Manifest fields captured before the payload is handed to the resolver.
struct ManifestRecord {
    descriptor: ResourceDescriptor,
    content: String,
}

impl ManifestRecord {
    fn from_payload(payload: &PushPayload) -> Self {
        let content = payload
            .descriptor
            .content
            .clone()
            .unwrap_or_else(|| payload.content_digest.clone());
        Self {
            descriptor: payload.descriptor.clone(),
            content,
        }
    }

    /// Overlays the pushed state on the prior entry, keeping fields this
    /// client does not manage.
    fn into_entry(
        self,
        prior: Option<ManifestEntry>,
        version: VersionStamp,
        tenant: &str,
    ) -> ManifestEntry {
        let mut entry = prior.unwrap_or_default();
        entry.version = version;
        entry.name = self.descriptor.name;
        entry.api_name = self.descriptor.api_name;
        entry.content = self.content;
        entry.kind = self.descriptor.kind.as_str().to_string();
        entry.namespace = self.descriptor.namespace;
        entry.return_type = self.descriptor.return_type;
        entry.binding_target = self.descriptor.binding_target;
        entry.lang = self.descriptor.lang;
        if !tenant.is_empty() {
            entry.tenant = tenant.to_string();
        }
        entry
    }
}
