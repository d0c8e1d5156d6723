//! Content provenance.
//!
//! The adapters and the payload assembler read resource files through
//! [`ContentSource`], which abstracts over the local filesystem and a
//! git-hosted repository tree. Paths are forward-slash separated and
//! relative to the source root.

mod git_tree;
mod local;

pub use git_tree::GitTreeSource;
pub use local::LocalSource;

use crate::error::SyncResult;
use async_trait::async_trait;

/// An immediate child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Last path component.
    pub name: String,
    /// Path relative to the source root.
    pub path: String,
    pub is_dir: bool,
}

/// A file found by a recursive walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the source root.
    pub path: String,
    /// Path relative to the walked directory.
    pub relative: String,
    pub size: u64,
}

impl SourceFile {
    /// Returns the last path component.
    pub fn file_name(&self) -> &str {
        file_name(&self.path)
    }
}

/// Read-only access to a tree of resource files.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Human-readable location, for log and error messages.
    fn describe(&self) -> String;

    /// Reads a file. A missing file is
    /// [`SyncError::PreconditionFailed`](crate::SyncError::PreconditionFailed).
    async fn read(&self, path: &str) -> SyncResult<Vec<u8>>;

    /// Returns true when `path` names an existing file.
    async fn is_file(&self, path: &str) -> SyncResult<bool>;

    /// Lists the immediate children of `dir`, sorted by name. A missing
    /// directory lists as empty.
    async fn list_dir(&self, dir: &str) -> SyncResult<Vec<SourceEntry>>;

    /// Lists every file below `dir`, sorted by path. A missing directory
    /// walks as empty.
    async fn walk(&self, dir: &str) -> SyncResult<Vec<SourceFile>>;
}

/// Joins two relative source paths.
pub fn join_path(base: &str, child: &str) -> String {
    let base = base.trim_end_matches('/');
    let child = child.trim_start_matches('/');
    match (base.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base}/{child}"),
    }
}

/// Returns the last component of a source path.
pub fn file_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

/// Strips a trailing extension from a file name.
pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}
