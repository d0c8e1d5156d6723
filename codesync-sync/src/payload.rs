//! Request bodies sent to the remote service.

use codesync_types::{ResourceKey, ResourceKind, VersionStamp};
use serde::{Deserialize, Serialize};

/// One uploaded file, referenced from a push request by its server token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    #[serde(rename = "fileName")]
    pub file_name: String,
    /// Path relative to the bucket root. Equal to `file_name` for flat files.
    #[serde(rename = "path")]
    pub relative_path: String,
    #[serde(rename = "fileSize")]
    pub size_bytes: u64,
    /// Opaque upload token. `None` when the upload failed; the service is
    /// expected to reject the request if the file was required.
    #[serde(rename = "fileToken")]
    pub server_token: Option<String>,
}

/// A resource's multi-file body. The two shapes are mutually exclusive on the
/// wire: a request carries either `sourceFiles` or `fileTree`, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FileSet {
    /// Files without their subdirectory paths.
    #[serde(rename = "sourceFiles")]
    Flat(Vec<FileReference>),
    /// Files keyed by their path relative to the `fileTree` directory.
    #[serde(rename = "fileTree")]
    Tree(Vec<FileReference>),
}

impl FileSet {
    /// Returns the file references regardless of shape.
    pub fn files(&self) -> &[FileReference] {
        match self {
            FileSet::Flat(files) | FileSet::Tree(files) => files,
        }
    }

    /// Returns true for the path-preserving shape.
    pub fn is_tree(&self) -> bool {
        matches!(self, FileSet::Tree(_))
    }
}

impl Default for FileSet {
    fn default() -> Self {
        FileSet::Flat(Vec::new())
    }
}

/// Identity and kind-specific fields of a resource, sent on its own to the
/// pre-flight endpoints and flattened into every push request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    #[serde(rename = "apiName")]
    pub api_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// Script text (function/class only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "nameSpace")]
    pub namespace: String,
    #[serde(rename = "returnType")]
    pub return_type: String,
    #[serde(rename = "bindingObjectApiName")]
    pub binding_target: String,
    pub lang: i64,
}

/// A complete push request for one resource.
#[derive(Debug, Clone, Serialize)]
pub struct PushPayload {
    #[serde(skip)]
    pub key: ResourceKey,
    #[serde(flatten)]
    pub descriptor: ResourceDescriptor,
    #[serde(rename = "metadataXml", skip_serializing_if = "Option::is_none")]
    pub metadata_xml: Option<String>,
    #[serde(flatten)]
    pub files: FileSet,
    #[serde(rename = "staticFiles")]
    pub static_assets: Vec<FileReference>,
    #[serde(rename = "updateTime")]
    pub version: VersionStamp,
    /// `sha256:<hex>` over the metadata document and every file, recorded in
    /// the manifest for bundles.
    #[serde(skip)]
    pub content_digest: String,
}

impl PushPayload {
    /// Serializes the request body.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
