//! Function and class adapters.
//!
//! A script resource is a single `<identifier>.groovy` file. Before upload
//! the service must accept it through static analysis and a compile check.

use super::{FieldDefaults, ResourceAdapter, ResourceLocation};
use crate::error::{SyncError, SyncResult};
use crate::payload::ResourceDescriptor;
use crate::remote::{CompileOutcome, RemoteService, Violation};
use crate::source::{file_name, file_stem, join_path, ContentSource};
use async_trait::async_trait;
use codesync_manifest::ManifestEntry;
use codesync_types::{ResourceKey, ResourceKind};
use tracing::{debug, warn};

/// Script file extension.
pub const SCRIPT_EXTENSION: &str = "groovy";

async fn discover_scripts(
    source: &dyn ContentSource,
    root: &str,
) -> SyncResult<Vec<ResourceLocation>> {
    let suffix = format!(".{SCRIPT_EXTENSION}");
    Ok(source
        .list_dir(root)
        .await?
        .into_iter()
        .filter(|entry| !entry.is_dir && entry.name.ends_with(&suffix))
        .map(|entry| ResourceLocation {
            name: file_stem(&entry.name).to_string(),
            path: entry.path,
        })
        .collect())
}

async fn locate_script(
    kind: ResourceKind,
    source: &dyn ContentSource,
    root: &str,
    name: &str,
) -> SyncResult<ResourceLocation> {
    let stem = name
        .strip_suffix(&format!(".{SCRIPT_EXTENSION}"))
        .unwrap_or(name);
    let path = join_path(root, &format!("{stem}.{SCRIPT_EXTENSION}"));
    if !source.is_file(&path).await? {
        return Err(SyncError::PreconditionFailed(format!(
            "no {kind} file {path} in {}",
            source.describe()
        )));
    }
    Ok(ResourceLocation {
        name: stem.to_string(),
        path,
    })
}

fn script_location(path: &str) -> ResourceLocation {
    ResourceLocation {
        name: file_stem(file_name(path)).to_string(),
        path: path.to_string(),
    }
}

async fn read_script(source: &dyn ContentSource, location: &ResourceLocation) -> SyncResult<String> {
    let bytes = source.read(&location.path).await?;
    String::from_utf8(bytes)
        .map_err(|_| SyncError::PreconditionFailed(format!("{} is not UTF-8", location.path)))
}

/// Static analysis then compile check. Serious violations, an unsuccessful
/// analysis and a failed compile are fatal; other findings are returned.
pub(crate) async fn run_preflight(
    remote: &dyn RemoteService,
    descriptor: &ResourceDescriptor,
) -> SyncResult<Vec<Violation>> {
    let report = remote.analyze(descriptor).await?;
    let (serious, advisory): (Vec<Violation>, Vec<Violation>) =
        report.violations.into_iter().partition(Violation::is_serious);

    for violation in &advisory {
        warn!(
            "{} {}: analysis (priority {}): {}",
            descriptor.kind, descriptor.api_name, violation.priority, violation.message
        );
    }

    if !serious.is_empty() {
        let messages: Vec<String> = serious
            .iter()
            .map(|v| match v.line {
                Some(line) => format!("line {line}: {}", v.message),
                None => v.message.clone(),
            })
            .collect();
        return Err(SyncError::ValidationFailed(format!(
            "{} {}: {}",
            descriptor.kind,
            descriptor.api_name,
            messages.join("; ")
        )));
    }

    if !report.success {
        return Err(SyncError::ValidationFailed(format!(
            "{} {}: {}",
            descriptor.kind,
            descriptor.api_name,
            report
                .message
                .unwrap_or_else(|| "static analysis failed".to_string())
        )));
    }

    match remote.compile_check(descriptor).await? {
        CompileOutcome::Passed => {
            debug!("{} {} compiled", descriptor.kind, descriptor.api_name);
            Ok(advisory)
        }
        CompileOutcome::Failed(message) => Err(SyncError::ValidationFailed(format!(
            "{} {}: {}",
            descriptor.kind, descriptor.api_name, message
        ))),
    }
}

/// Serverless functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionAdapter;

#[async_trait]
impl ResourceAdapter for FunctionAdapter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Function
    }

    fn defaults(&self) -> FieldDefaults {
        FieldDefaults {
            namespace: "common",
            return_type: "void",
            binding_target: "NONE",
        }
    }

    fn location_from_path(&self, path: &str) -> ResourceLocation {
        script_location(path)
    }

    async fn discover(
        &self,
        source: &dyn ContentSource,
        root: &str,
    ) -> SyncResult<Vec<ResourceLocation>> {
        discover_scripts(source, root).await
    }

    async fn locate(
        &self,
        source: &dyn ContentSource,
        root: &str,
        name: &str,
    ) -> SyncResult<ResourceLocation> {
        locate_script(self.kind(), source, root, name).await
    }

    async fn describe(
        &self,
        key: &ResourceKey,
        prior: Option<&ManifestEntry>,
        source: &dyn ContentSource,
        location: &ResourceLocation,
    ) -> SyncResult<ResourceDescriptor> {
        let content = read_script(source, location).await?;
        Ok(self.defaults().descriptor(key, location, prior, Some(content)))
    }

    async fn preflight(
        &self,
        remote: &dyn RemoteService,
        descriptor: &ResourceDescriptor,
    ) -> SyncResult<Vec<Violation>> {
        run_preflight(remote, descriptor).await
    }
}

/// Server-side classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassAdapter;

#[async_trait]
impl ResourceAdapter for ClassAdapter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Class
    }

    fn defaults(&self) -> FieldDefaults {
        FieldDefaults {
            namespace: "library",
            return_type: "",
            binding_target: "",
        }
    }

    fn location_from_path(&self, path: &str) -> ResourceLocation {
        script_location(path)
    }

    async fn discover(
        &self,
        source: &dyn ContentSource,
        root: &str,
    ) -> SyncResult<Vec<ResourceLocation>> {
        discover_scripts(source, root).await
    }

    async fn locate(
        &self,
        source: &dyn ContentSource,
        root: &str,
        name: &str,
    ) -> SyncResult<ResourceLocation> {
        locate_script(self.kind(), source, root, name).await
    }

    async fn describe(
        &self,
        key: &ResourceKey,
        prior: Option<&ManifestEntry>,
        source: &dyn ContentSource,
        location: &ResourceLocation,
    ) -> SyncResult<ResourceDescriptor> {
        let content = read_script(source, location).await?;
        Ok(self.defaults().descriptor(key, location, prior, Some(content)))
    }

    async fn preflight(
        &self,
        remote: &dyn RemoteService,
        descriptor: &ResourceDescriptor,
    ) -> SyncResult<Vec<Violation>> {
        run_preflight(remote, descriptor).await
    }
}
