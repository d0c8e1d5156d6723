//! Push engine for codesync.
//!
//! Synchronizes locally authored (or repository-hosted) components,
//! plugins, functions and classes with a remote service that guards every
//! resource with a server-issued version stamp.
//!
//! # Architecture
//!
//! ```text
//! SyncOrchestrator ── enumerates resources, isolates failures
//!   ├── ResourceAdapter (per kind) ── identity, defaults, pre-flight
//!   ├── PayloadAssembler ── buckets files, uploads, builds the request
//!   ├── ConflictResolver ── bounded submit/classify/recover loop
//!   └── ManifestStore ── updated only after an accepted push
//! ```
//!
//! Content comes from a [`ContentSource`]: [`LocalSource`] for a working
//! tree, [`GitTreeSource`] for a repository branch.

pub mod adapter;
pub mod assembler;
pub mod classify;
pub mod config;
pub mod error;
pub mod git;
pub mod orchestrator;
pub mod payload;
pub mod pull;
pub mod remote;
pub mod remote_source;
pub mod retry;
pub mod source;

pub use adapter::{adapter_for, ResourceAdapter, ResourceLocation};
pub use assembler::PayloadAssembler;
pub use classify::{classify, FailureCategory};
pub use config::{GitSourceConfig, RetryConfig, ServiceConfig, SyncConfig, WorkspaceConfig};
pub use error::{SyncError, SyncResult};
pub use git::{CredentialPrompt, GitHostClient, NoCredentialPrompt};
pub use orchestrator::{BatchReport, KindSelection, KindSummary, SyncOrchestrator, SyncOutcome};
pub use payload::{FileReference, FileSet, PushPayload, ResourceDescriptor};
pub use pull::PullOutcome;
pub use remote::{
    AnalysisReport, CompileOutcome, HttpRemoteService, RemoteResource, RemoteService,
    SubmitReceipt, Violation,
};
pub use remote_source::{push_from_repository, RemoteManifest};
pub use retry::{ConflictResolver, PushAccepted};
pub use source::{ContentSource, GitTreeSource, LocalSource};
