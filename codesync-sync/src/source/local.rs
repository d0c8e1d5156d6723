//! Local filesystem content source.

use super::{join_path, ContentSource, SourceEntry, SourceFile};
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Resource files under a local directory.
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

#[async_trait]
impl ContentSource for LocalSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn read(&self, path: &str) -> SyncResult<Vec<u8>> {
        let full = self.resolve(path);
        match fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SyncError::PreconditionFailed(
                format!("missing file {}", full.display()),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn is_file(&self, path: &str) -> SyncResult<bool> {
        match fs::metadata(self.resolve(path)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_dir(&self, dir: &str) -> SyncResult<Vec<SourceEntry>> {
        let mut reader = match fs::read_dir(self.resolve(dir)).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type().await?.is_dir();
            entries.push(SourceEntry {
                path: join_path(dir, &name),
                name,
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn walk(&self, dir: &str) -> SyncResult<Vec<SourceFile>> {
        let mut files = Vec::new();
        let mut pending = vec![String::new()];

        while let Some(relative_dir) = pending.pop() {
            let absolute = self.resolve(&join_path(dir, &relative_dir));
            let mut reader = match fs::read_dir(&absolute).await {
                Ok(reader) => reader,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = reader.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                let relative = join_path(&relative_dir, &name);
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(relative);
                } else if file_type.is_file() {
                    let size = entry.metadata().await?.len();
                    files.push(SourceFile {
                        path: join_path(dir, &relative),
                        relative,
                        size,
                    });
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}
