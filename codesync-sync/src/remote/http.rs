//! HTTP implementation of the remote service.
//!
//! Every endpoint answers with a JSON envelope
//! `{ "code": 0, "message": "", "data": ... }`; a non-zero code is a
//! rejection whose message is passed through verbatim.

use super::{AnalysisReport, CompileOutcome, RemoteResource, RemoteService, SubmitReceipt};
use crate::config::ServiceConfig;
use crate::error::{SyncError, SyncResult};
use crate::payload::{PushPayload, ResourceDescriptor};
use async_trait::async_trait;
use codesync_types::{ResourceKey, ResourceKind};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Header carrying the tenant id.
pub const TENANT_HEADER: &str = "X-Tenant-Id";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    token: String,
}

#[derive(Debug, Serialize)]
struct FindRequest<'a> {
    #[serde(rename = "apiName")]
    api_name: &'a str,
}

/// Remote service client over HTTP/JSON.
pub struct HttpRemoteService {
    config: ServiceConfig,
    client: Client,
}

impl HttpRemoteService {
    /// Creates a client for the configured service.
    pub fn new(config: ServiceConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SyncError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn kind_url(&self, kind: ResourceKind, action: &str) -> String {
        self.url(&format!("/api/{}/{}", kind.as_str(), action))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(TENANT_HEADER, &self.config.tenant_id);
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post_json<B, T>(&self, url: String, body: &B) -> SyncResult<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {}", url);
        let response = self
            .authorized(self.client.post(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("request to {url} failed: {e}")))?;

        read_envelope(response).await
    }
}

/// Unwraps an envelope, mapping HTTP and service-level failures to errors.
async fn read_envelope<T: DeserializeOwned>(response: Response) -> SyncResult<Option<T>> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| SyncError::Transport(format!("failed to read response body: {e}")))?;

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(SyncError::Auth(format!("service rejected credentials ({status})")));
    }

    if !status.is_success() {
        // Error pages sometimes still carry an envelope with the real message.
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
            .ok()
            .map(|env| env.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP {status}: {body}"));
        return Err(SyncError::Remote(message));
    }

    let envelope: Envelope<T> = serde_json::from_str(&body)?;
    if envelope.code != 0 {
        return Err(SyncError::Remote(envelope.message));
    }
    Ok(envelope.data)
}

#[async_trait]
impl RemoteService for HttpRemoteService {
    async fn upload_file(&self, name: &str, content: &[u8]) -> SyncResult<String> {
        let url = self.url("/api/files/upload");
        debug!("Uploading file: {} ({} bytes)", name, content.len());

        let response = self
            .authorized(self.client.post(&url))
            .query(&[("name", name)])
            .header("Content-Type", "application/octet-stream")
            .body(content.to_vec())
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("upload of {name} failed: {e}")))?;

        let data: Option<UploadData> = read_envelope(response).await?;
        data.map(|d| d.token)
            .ok_or_else(|| SyncError::Remote(format!("upload of {name} returned no token")))
    }

    async fn analyze(&self, descriptor: &ResourceDescriptor) -> SyncResult<AnalysisReport> {
        let report = self
            .post_json(self.kind_url(descriptor.kind, "analyze"), descriptor)
            .await?;
        Ok(report.unwrap_or_else(AnalysisReport::clean))
    }

    async fn compile_check(&self, descriptor: &ResourceDescriptor) -> SyncResult<CompileOutcome> {
        let result: SyncResult<Option<serde_json::Value>> = self
            .post_json(self.kind_url(descriptor.kind, "compile"), descriptor)
            .await;
        match result {
            Ok(_) => Ok(CompileOutcome::Passed),
            Err(SyncError::Remote(message)) => Ok(CompileOutcome::Failed(message)),
            Err(e) => Err(e),
        }
    }

    async fn submit(&self, payload: &PushPayload) -> SyncResult<SubmitReceipt> {
        let receipt: Option<SubmitReceipt> = self
            .post_json(self.kind_url(payload.key.kind(), "push"), payload)
            .await?;
        info!("Pushed {} (submitted version {})", payload.key, payload.version);
        Ok(receipt.unwrap_or_default())
    }

    async fn lookup(&self, key: &ResourceKey) -> SyncResult<Option<RemoteResource>> {
        let request = FindRequest {
            api_name: key.api_name(),
        };
        self.post_json(self.kind_url(key.kind(), "find"), &request).await
    }
}
