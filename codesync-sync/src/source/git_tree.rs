//! Repository tree content source.

use super::{join_path, ContentSource, SourceEntry, SourceFile};
use crate::error::{SyncError, SyncResult};
use crate::git::{GitHostClient, TreeEntry, TreeEntryType};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Resource files in a git-hosted repository at the configured branch.
///
/// The recursive tree is fetched once on first use; blob contents are
/// fetched on every read.
pub struct GitTreeSource {
    client: Arc<GitHostClient>,
    prefix: String,
    tree: OnceCell<BTreeMap<String, TreeEntry>>,
}

impl GitTreeSource {
    /// Creates a source over the whole repository.
    pub fn new(client: Arc<GitHostClient>) -> Self {
        Self::with_prefix(client, "")
    }

    /// Creates a source rooted at a repository subdirectory.
    pub fn with_prefix(client: Arc<GitHostClient>, prefix: &str) -> Self {
        Self {
            client,
            prefix: prefix.trim_matches('/').to_string(),
            tree: OnceCell::new(),
        }
    }

    async fn tree(&self) -> SyncResult<&BTreeMap<String, TreeEntry>> {
        self.tree
            .get_or_try_init(|| async {
                let entries = self.client.fetch_tree().await?;
                Ok::<_, SyncError>(
                    entries
                        .into_iter()
                        .map(|entry| (entry.path.clone(), entry))
                        .collect(),
                )
            })
            .await
    }

    fn repo_path(&self, path: &str) -> String {
        join_path(&self.prefix, path.trim_matches('/'))
    }

    fn strip_prefix<'a>(&self, repo_path: &'a str) -> &'a str {
        if self.prefix.is_empty() {
            return repo_path;
        }
        repo_path
            .strip_prefix(&self.prefix)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(repo_path)
    }

    /// Entries strictly below `dir` (repository-relative).
    fn descendants<'t>(
        tree: &'t BTreeMap<String, TreeEntry>,
        dir: &str,
    ) -> impl Iterator<Item = (&'t String, &'t TreeEntry)> {
        let lower = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };
        tree.range(lower.clone()..)
            .take_while(move |(path, _)| path.starts_with(&lower))
            .filter(|(path, _)| !path.is_empty())
    }
}

#[async_trait]
impl ContentSource for GitTreeSource {
    fn describe(&self) -> String {
        if self.prefix.is_empty() {
            self.client.describe()
        } else {
            format!("{}:{}", self.client.describe(), self.prefix)
        }
    }

    async fn read(&self, path: &str) -> SyncResult<Vec<u8>> {
        let repo_path = self.repo_path(path);
        let entry = self
            .tree()
            .await?
            .get(&repo_path)
            .filter(|entry| entry.entry_type == TreeEntryType::Blob)
            .ok_or_else(|| {
                SyncError::PreconditionFailed(format!(
                    "missing file {} in {}",
                    repo_path,
                    self.client.describe()
                ))
            })?;
        self.client.fetch_blob(&entry.sha).await
    }

    async fn is_file(&self, path: &str) -> SyncResult<bool> {
        let repo_path = self.repo_path(path);
        Ok(self
            .tree()
            .await?
            .get(&repo_path)
            .is_some_and(|entry| entry.entry_type == TreeEntryType::Blob))
    }

    async fn list_dir(&self, dir: &str) -> SyncResult<Vec<SourceEntry>> {
        let repo_dir = self.repo_path(dir);
        let tree = self.tree().await?;

        let mut entries: Vec<SourceEntry> = Self::descendants(tree, &repo_dir)
            .filter_map(|(path, entry)| {
                let rest = if repo_dir.is_empty() {
                    path.as_str()
                } else {
                    &path[repo_dir.len() + 1..]
                };
                // Immediate children only.
                if rest.contains('/') {
                    return None;
                }
                Some(SourceEntry {
                    name: rest.to_string(),
                    path: self.strip_prefix(path).to_string(),
                    is_dir: entry.entry_type == TreeEntryType::Tree,
                })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn walk(&self, dir: &str) -> SyncResult<Vec<SourceFile>> {
        let repo_dir = self.repo_path(dir);
        let tree = self.tree().await?;

        let files = Self::descendants(tree, &repo_dir)
            .filter(|(_, entry)| entry.entry_type == TreeEntryType::Blob)
            .map(|(path, entry)| {
                let relative = if repo_dir.is_empty() {
                    path.clone()
                } else {
                    path[repo_dir.len() + 1..].to_string()
                };
                SourceFile {
                    path: self.strip_prefix(path).to_string(),
                    relative,
                    size: entry.size.unwrap_or(0),
                }
            })
            .collect();
        // BTreeMap iteration is already sorted by path.
        Ok(files)
    }
}
