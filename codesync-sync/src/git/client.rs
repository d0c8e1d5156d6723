//! REST client for a GitHub-compatible git host.

use super::prompt::CredentialPrompt;
use crate::config::GitSourceConfig;
use crate::error::{SyncError, SyncResult};
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("codesync/", env!("CARGO_PKG_VERSION"));

/// Object type of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeEntryType {
    Blob,
    Tree,
    Commit,
}

/// One entry of a recursive tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the repository root.
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: TreeEntryType,
    pub sha: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    truncated: bool,
    tree: Vec<TreeEntry>,
}

#[derive(Debug, Deserialize)]
struct EncodedContent {
    content: String,
    #[serde(default)]
    encoding: String,
}

impl EncodedContent {
    fn decode(self) -> SyncResult<Vec<u8>> {
        if !self.encoding.is_empty() && self.encoding != "base64" {
            return Err(SyncError::Transport(format!(
                "unsupported content encoding: {}",
                self.encoding
            )));
        }
        // The host wraps base64 payloads at 60 columns.
        let compact: String = self.content.split_whitespace().collect();
        STANDARD
            .decode(compact)
            .map_err(|e| SyncError::Transport(format!("invalid base64 content: {e}")))
    }
}

/// Git host client.
///
/// The token starts as the configured one and is replaced in memory when the
/// host rejects it and the user supplies a new one. It is never persisted.
pub struct GitHostClient {
    config: GitSourceConfig,
    client: Client,
    credentials: Arc<RwLock<Option<String>>>,
    prompt: Arc<dyn CredentialPrompt>,
}

impl GitHostClient {
    /// Creates a client for the configured repository.
    pub fn new(config: GitSourceConfig, prompt: Arc<dyn CredentialPrompt>) -> SyncResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            credentials: Arc::new(RwLock::new(config.token.clone())),
            config,
            client,
            prompt,
        })
    }

    /// Returns the repository configuration.
    pub fn config(&self) -> &GitSourceConfig {
        &self.config
    }

    /// `owner/repo@branch`, for log messages.
    pub fn describe(&self) -> String {
        format!(
            "{}/{}@{}",
            self.config.owner, self.config.repo, self.config.branch
        )
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.owner),
            urlencoding::encode(&self.config.repo),
            path
        )
    }

    fn host(&self) -> String {
        reqwest::Url::parse(&self.config.api_base_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| self.config.api_base_url.clone())
    }

    /// Sends an authenticated GET, prompting for a new token when the host
    /// answers 401/403.
    async fn get(&self, url: &str) -> SyncResult<Response> {
        let mut prompts = 0;
        loop {
            let token = self.credentials.read().await.clone();
            let mut request = self
                .client
                .get(url)
                .header("Accept", "application/vnd.github+json");
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }

            debug!("GET {}", url);
            let response = request
                .send()
                .await
                .map_err(|e| SyncError::Transport(format!("request to {url} failed: {e}")))?;

            let status = response.status();
            if status != StatusCode::UNAUTHORIZED && status != StatusCode::FORBIDDEN {
                return Ok(response);
            }

            if prompts >= self.config.max_auth_prompts {
                return Err(SyncError::Auth(format!(
                    "{} rejected credentials ({status})",
                    self.host()
                )));
            }
            prompts += 1;
            warn!("{} rejected credentials ({}), asking for a new token", self.host(), status);

            let prompt = Arc::clone(&self.prompt);
            let host = self.host();
            let reason = format!("{status} from {host}");
            let supplied = tokio::task::spawn_blocking(move || prompt.prompt_token(&host, &reason))
                .await
                .map_err(|e| SyncError::Auth(format!("credential prompt failed: {e}")))?;

            match supplied.filter(|t| !t.trim().is_empty()) {
                Some(token) => *self.credentials.write().await = Some(token.trim().to_string()),
                None => return Err(SyncError::Auth("credential prompt declined".to_string())),
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> SyncResult<T> {
        let response = self.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Transport(format!("HTTP {status} from {url}: {body}")));
        }
        response
            .json()
            .await
            .map_err(|e| SyncError::Transport(format!("failed to parse response from {url}: {e}")))
    }

    /// Lists every entry of the configured branch.
    pub async fn fetch_tree(&self) -> SyncResult<Vec<TreeEntry>> {
        let url = self.repo_url(&format!(
            "git/trees/{}?recursive=1",
            urlencoding::encode(&self.config.branch)
        ));
        let response: TreeResponse = self.get_json(&url).await?;
        if response.truncated {
            return Err(SyncError::Transport(format!(
                "tree listing for {} truncated by the host ({} entries returned)",
                self.describe(),
                response.tree.len()
            )));
        }
        info!("Fetched {} tree entries from {}", response.tree.len(), self.describe());
        Ok(response.tree)
    }

    /// Downloads a blob by sha.
    pub async fn fetch_blob(&self, sha: &str) -> SyncResult<Vec<u8>> {
        let url = self.repo_url(&format!("git/blobs/{}", urlencoding::encode(sha)));
        let blob: EncodedContent = self.get_json(&url).await?;
        blob.decode()
    }

    /// Downloads a file at the configured branch. `None` when the file does
    /// not exist.
    pub async fn fetch_file(&self, path: &str) -> SyncResult<Option<Vec<u8>>> {
        let encoded_path = path
            .split('/')
            .filter(|part| !part.is_empty())
            .map(|part| urlencoding::encode(part).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let url = self.repo_url(&format!(
            "contents/{}?ref={}",
            encoded_path,
            urlencoding::encode(&self.config.branch)
        ));

        let response = self.get(&url).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("{} not present in {}", path, self.describe());
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Transport(format!("HTTP {status} from {url}: {body}")));
        }

        let content: EncodedContent = response
            .json()
            .await
            .map_err(|e| SyncError::Transport(format!("failed to parse response from {url}: {e}")))?;
        content.decode().map(Some)
    }
}
