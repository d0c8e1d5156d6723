//! Remote service abstraction.
//!
//! The engine only needs five calls from the service. Everything that talks
//! to the network goes through [`RemoteService`], so the retry engine and
//! orchestrator can be driven by a scripted implementation in tests.

mod http;

pub use http::HttpRemoteService;

use crate::error::SyncResult;
use crate::payload::{PushPayload, ResourceDescriptor};
use async_trait::async_trait;
use codesync_types::{ResourceKey, VersionStamp};
use serde::{Deserialize, Serialize};

/// Violations at or above this priority abort the push.
pub const SERIOUS_PRIORITY: u32 = 9;

/// A single static-analysis finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub priority: u32,
    pub message: String,
    #[serde(default)]
    pub line: Option<u32>,
}

impl Violation {
    /// Returns true when this violation is fatal for the push.
    pub fn is_serious(&self) -> bool {
        self.priority >= SERIOUS_PRIORITY
    }
}

/// Result of the static-analysis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub violations: Vec<Violation>,
}

fn default_true() -> bool {
    true
}

impl AnalysisReport {
    /// A passing report with no findings.
    pub fn clean() -> Self {
        Self {
            success: true,
            message: None,
            violations: Vec::new(),
        }
    }
}

/// Result of the compile-check call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    Passed,
    /// The service's failure message.
    Failed(String),
}

/// Response to an accepted push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubmitReceipt {
    /// New version stamp, when the service returns one.
    #[serde(rename = "updateTime", default)]
    pub version: Option<VersionStamp>,
}

/// A resource as the server currently holds it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteResource {
    #[serde(rename = "apiName")]
    pub api_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "updateTime")]
    pub version: VersionStamp,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "nameSpace", default)]
    pub namespace: String,
    #[serde(rename = "returnType", default)]
    pub return_type: String,
    #[serde(rename = "bindingObjectApiName", default)]
    pub binding_target: String,
    #[serde(default)]
    pub lang: i64,
}

/// Calls the engine consumes from the remote service.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Uploads one file and returns its opaque reference token.
    async fn upload_file(&self, name: &str, content: &[u8]) -> SyncResult<String>;

    /// Runs static analysis on a script resource.
    async fn analyze(&self, descriptor: &ResourceDescriptor) -> SyncResult<AnalysisReport>;

    /// Compiles a script resource without saving it.
    async fn compile_check(&self, descriptor: &ResourceDescriptor) -> SyncResult<CompileOutcome>;

    /// Submits a push request. A rejection comes back as
    /// [`SyncError::Remote`](crate::SyncError::Remote) carrying the
    /// service's message.
    async fn submit(&self, payload: &PushPayload) -> SyncResult<SubmitReceipt>;

    /// Fetches the server's current copy of a resource, `None` if absent.
    async fn lookup(&self, key: &ResourceKey) -> SyncResult<Option<RemoteResource>>;
}
