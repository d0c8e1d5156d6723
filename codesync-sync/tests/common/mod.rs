//! Shared test helpers for push engine tests.

#![allow(dead_code)]

use async_trait::async_trait;
use codesync_manifest::JsonManifestStore;
use codesync_sync::{
    AnalysisReport, CompileOutcome, PushPayload, RemoteResource, RemoteService,
    ResourceDescriptor, SubmitReceipt, SyncError, SyncOrchestrator, SyncResult,
};
use codesync_types::{ResourceKey, VersionStamp};
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Scripted answer to one submit call.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Accept, returning this version.
    Accept(i64),
    /// Accept without returning a version.
    AcceptSilently,
    /// Reject with this message.
    Reject(String),
}

pub fn reject(message: &str) -> Reply {
    Reply::Reject(message.to_string())
}

/// One recorded submit call.
#[derive(Debug, Clone)]
pub struct Submission {
    pub api_name: String,
    pub version: i64,
    pub body: Value,
}

#[derive(Default)]
struct State {
    replies: HashMap<String, VecDeque<Reply>>,
    always_reject: HashMap<String, String>,
    lookups: HashMap<String, RemoteResource>,
    failing_lookups: HashSet<String>,
    analysis: HashMap<String, AnalysisReport>,
    compile_failures: HashMap<String, String>,
    failing_uploads: HashSet<String>,
    next_version: i64,

    uploads: Vec<String>,
    submissions: Vec<Submission>,
    lookups_made: Vec<String>,
    analyzed: Vec<String>,
    compiled: Vec<String>,
}

/// In-memory remote service with scripted answers.
///
/// Unscripted submits are accepted with increasing versions starting at
/// 1000; unscripted lookups find nothing; analysis and compile pass.
pub struct ScriptedRemote {
    state: Mutex<State>,
}

impl ScriptedRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                next_version: 1000,
                ..Default::default()
            }),
        })
    }

    /// Queues submit replies for `api_name`, consumed in order.
    pub fn replies(&self, api_name: &str, replies: Vec<Reply>) {
        self.state
            .lock()
            .unwrap()
            .replies
            .entry(api_name.to_string())
            .or_default()
            .extend(replies);
    }

    /// Rejects every submit of `api_name` with `message`.
    pub fn always_reject(&self, api_name: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .always_reject
            .insert(api_name.to_string(), message.to_string());
    }

    /// Makes lookups of `api_name` find the resource at `version`.
    pub fn server_has(&self, api_name: &str, version: i64) {
        self.server_has_content(api_name, version, None);
    }

    pub fn server_has_content(&self, api_name: &str, version: i64, content: Option<&str>) {
        self.state.lock().unwrap().lookups.insert(
            api_name.to_string(),
            RemoteResource {
                api_name: api_name.to_string(),
                name: api_name.to_string(),
                version: VersionStamp::from_server(version),
                content: content.map(str::to_string),
                namespace: String::new(),
                return_type: String::new(),
                binding_target: String::new(),
                lang: 0,
            },
        );
    }

    /// Makes lookups of `api_name` fail with a transport error.
    pub fn lookup_fails(&self, api_name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_lookups
            .insert(api_name.to_string());
    }

    pub fn analysis(&self, api_name: &str, report: AnalysisReport) {
        self.state
            .lock()
            .unwrap()
            .analysis
            .insert(api_name.to_string(), report);
    }

    pub fn compile_fails(&self, api_name: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .compile_failures
            .insert(api_name.to_string(), message.to_string());
    }

    /// Makes uploads of files named `file_name` fail.
    pub fn upload_fails(&self, file_name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_uploads
            .insert(file_name.to_string());
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn submissions_for(&self, api_name: &str) -> Vec<Submission> {
        self.submissions()
            .into_iter()
            .filter(|s| s.api_name == api_name)
            .collect()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn lookups(&self) -> Vec<String> {
        self.state.lock().unwrap().lookups_made.clone()
    }

    pub fn analyzed(&self) -> Vec<String> {
        self.state.lock().unwrap().analyzed.clone()
    }

    pub fn compiled(&self) -> Vec<String> {
        self.state.lock().unwrap().compiled.clone()
    }
}

#[async_trait]
impl RemoteService for ScriptedRemote {
    async fn upload_file(&self, name: &str, _content: &[u8]) -> SyncResult<String> {
        let mut state = self.state.lock().unwrap();
        if state.failing_uploads.contains(name) {
            return Err(SyncError::Transport(format!("upload of {name} reset")));
        }
        state.uploads.push(name.to_string());
        Ok(format!("tok-{}-{}", state.uploads.len(), name))
    }

    async fn analyze(&self, descriptor: &ResourceDescriptor) -> SyncResult<AnalysisReport> {
        let mut state = self.state.lock().unwrap();
        state.analyzed.push(descriptor.api_name.clone());
        Ok(state
            .analysis
            .get(&descriptor.api_name)
            .cloned()
            .unwrap_or_else(AnalysisReport::clean))
    }

    async fn compile_check(&self, descriptor: &ResourceDescriptor) -> SyncResult<CompileOutcome> {
        let mut state = self.state.lock().unwrap();
        state.compiled.push(descriptor.api_name.clone());
        Ok(match state.compile_failures.get(&descriptor.api_name) {
            Some(message) => CompileOutcome::Failed(message.clone()),
            None => CompileOutcome::Passed,
        })
    }

    async fn submit(&self, payload: &PushPayload) -> SyncResult<SubmitReceipt> {
        let mut state = self.state.lock().unwrap();
        let api_name = payload.key.api_name().to_string();
        state.submissions.push(Submission {
            api_name: api_name.clone(),
            version: payload.version.value(),
            body: payload.to_json()?,
        });

        if let Some(message) = state.always_reject.get(&api_name) {
            return Err(SyncError::Remote(message.clone()));
        }

        let scripted = state
            .replies
            .get_mut(&api_name)
            .and_then(|queue| queue.pop_front());
        match scripted {
            Some(Reply::Accept(version)) => Ok(SubmitReceipt {
                version: Some(VersionStamp::from_server(version)),
            }),
            Some(Reply::AcceptSilently) => Ok(SubmitReceipt { version: None }),
            Some(Reply::Reject(message)) => Err(SyncError::Remote(message)),
            None => {
                state.next_version += 1;
                Ok(SubmitReceipt {
                    version: Some(VersionStamp::from_server(state.next_version)),
                })
            }
        }
    }

    async fn lookup(&self, key: &ResourceKey) -> SyncResult<Option<RemoteResource>> {
        let mut state = self.state.lock().unwrap();
        state.lookups_made.push(key.api_name().to_string());
        if state.failing_lookups.contains(key.api_name()) {
            return Err(SyncError::Transport("lookup timed out".into()));
        }
        Ok(state.lookups.get(key.api_name()).cloned())
    }
}

// ── Workspace fixtures ──────────────────────────────────────────

/// Writes `content` at `root/relative`, creating parent directories.
pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Creates `components/<name>/component.xml` with flat source files.
pub fn component(root: &Path, name: &str, sources: &[&str]) {
    write(
        root,
        &format!("components/{name}/component.xml"),
        &format!("<component name=\"{name}\"/>"),
    );
    for file in sources {
        write(
            root,
            &format!("components/{name}/sourceFiles/{file}"),
            &format!("// {file}"),
        );
    }
}

/// Creates `classes/<name>.groovy`.
pub fn class(root: &Path, name: &str) {
    write(
        root,
        &format!("classes/{name}.groovy"),
        &format!("class {name} {{}}"),
    );
}

/// Creates `functions/<name>.groovy`.
pub fn function(root: &Path, name: &str) {
    write(
        root,
        &format!("functions/{name}.groovy"),
        &format!("def {name}() {{ return null }}"),
    );
}

/// Orchestrator backed by a manifest file under `root`.
pub fn orchestrator(remote: &Arc<ScriptedRemote>, root: &Path, max_retries: u32) -> SyncOrchestrator {
    let manifest = JsonManifestStore::new(root.join(codesync_manifest::MANIFEST_FILE_NAME));
    SyncOrchestrator::new(
        Arc::clone(remote) as Arc<dyn RemoteService>,
        Box::new(manifest),
        max_retries,
    )
}

/// Reads the manifest file under `root` as raw JSON.
pub fn manifest_json(root: &Path) -> Value {
    let bytes = std::fs::read(root.join(codesync_manifest::MANIFEST_FILE_NAME)).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
