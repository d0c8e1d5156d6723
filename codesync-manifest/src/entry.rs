//! Manifest entry record.

use codesync_types::VersionStamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Last-known state of one resource, as persisted in the manifest file.
///
/// Field names follow the on-disk JSON shape. Fields this client does not
/// know about are kept in `extra` so a rewrite never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Server-issued version stamp.
    #[serde(rename = "updateTime", default)]
    pub version: VersionStamp,
    /// Human-readable display name.
    #[serde(default)]
    pub name: String,
    /// Full api name (suffix included for bundles).
    #[serde(rename = "apiName", default)]
    pub api_name: String,
    /// Script text for function/class, `sha256:<hex>` digest for bundles.
    #[serde(default)]
    pub content: String,
    /// Object the resource is bound to, if any.
    #[serde(rename = "bindingObjectApiName", default)]
    pub binding_target: String,
    /// Resource kind wire name.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "nameSpace", default)]
    pub namespace: String,
    #[serde(rename = "returnType", default)]
    pub return_type: String,
    #[serde(rename = "tenantId", default)]
    pub tenant: String,
    /// Script language code (0 = Groovy).
    #[serde(default)]
    pub lang: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ManifestEntry {
    /// Returns a copy carrying a new server-confirmed version.
    #[must_use]
    pub fn with_version(mut self, version: VersionStamp) -> Self {
        self.version = version;
        self
    }
}
