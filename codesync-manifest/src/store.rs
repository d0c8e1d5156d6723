//! Manifest stores.
//!
//! The manifest is a single JSON object keyed by `"<kind>:<identifier>"`.
//! Every write is a full-file rewrite; callers own the read-modify-write
//! cycle and must not share a store between concurrent writers.

use crate::entry::ManifestEntry;
use crate::error::{ManifestError, ManifestResult};
use codesync_types::ResourceKey;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Parsed manifest contents.
pub type ManifestMap = BTreeMap<ResourceKey, ManifestEntry>;

/// Read/write access to last-known resource versions.
pub trait ManifestStore: Send + Sync {
    /// Loads every readable entry. Never fails: an absent or unreadable
    /// manifest yields an empty map.
    fn load(&self) -> ManifestMap;

    /// Looks up a single entry.
    fn lookup(&self, key: &ResourceKey) -> Option<ManifestEntry> {
        self.load().remove(key)
    }

    /// Merges `entry` into the stored record for `key`, preserving every
    /// other entry and any fields of the existing record the entry does
    /// not set.
    fn upsert(&mut self, key: &ResourceKey, entry: &ManifestEntry) -> ManifestResult<()>;
}

/// Parses a manifest document into typed entries.
///
/// Keys that are not valid resource keys and records that do not match the
/// entry shape are skipped with a warning rather than failing the whole
/// document.
pub fn parse_manifest(bytes: &[u8]) -> ManifestResult<ManifestMap> {
    let document: Map<String, Value> = serde_json::from_slice(bytes)?;
    Ok(typed_entries(document))
}

fn typed_entries(document: Map<String, Value>) -> ManifestMap {
    let mut entries = ManifestMap::new();
    for (raw_key, raw_entry) in document {
        let key = match ResourceKey::parse_manifest_key(&raw_key) {
            Ok(key) => key,
            Err(e) => {
                warn!("Skipping manifest key {:?}: {}", raw_key, e);
                continue;
            }
        };
        match serde_json::from_value::<ManifestEntry>(raw_entry) {
            Ok(entry) => {
                entries.insert(key, entry);
            }
            Err(e) => warn!("Skipping manifest entry {:?}: {}", raw_key, e),
        }
    }
    entries
}

/// Merges the entry's fields over an existing raw record.
fn merge_entry(document: &mut Map<String, Value>, key: &ResourceKey, entry: &ManifestEntry) -> ManifestResult<()> {
    let fields = match serde_json::to_value(entry)? {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };

    match document.get_mut(&key.manifest_key()) {
        Some(Value::Object(existing)) => {
            for (field, value) in fields {
                existing.insert(field, value);
            }
        }
        _ => {
            document.insert(key.manifest_key(), Value::Object(fields));
        }
    }
    Ok(())
}

/// Manifest persisted as a JSON file on the local filesystem.
#[derive(Debug, Clone)]
pub struct JsonManifestStore {
    path: PathBuf,
}

impl JsonManifestStore {
    /// Creates a store backed by `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the raw JSON object, `None` when the file does not exist.
    fn read_document(&self) -> ManifestResult<Option<Map<String, Value>>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Some(Map::new()));
        }
        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(ManifestError::NotAnObject {
                path: self.path.display().to_string(),
            }),
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> ManifestResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut body = serde_json::to_vec_pretty(document)?;
        body.push(b'\n');

        // Write-then-rename so an interrupted write never truncates the manifest.
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, &body)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl ManifestStore for JsonManifestStore {
    fn load(&self) -> ManifestMap {
        match self.read_document() {
            Ok(Some(document)) => typed_entries(document),
            Ok(None) => {
                debug!("No manifest at {}, starting empty", self.path.display());
                ManifestMap::new()
            }
            Err(e) => {
                warn!("Unreadable manifest at {}: {}", self.path.display(), e);
                ManifestMap::new()
            }
        }
    }

    fn upsert(&mut self, key: &ResourceKey, entry: &ManifestEntry) -> ManifestResult<()> {
        // An unreadable existing file is an error here: rewriting it would
        // discard entries we could not parse.
        let mut document = self.read_document()?.unwrap_or_default();
        merge_entry(&mut document, key, entry)?;
        self.write_document(&document)?;
        debug!(
            "Manifest {} updated: {} -> {}",
            self.path.display(),
            key.manifest_key(),
            entry.version
        );
        Ok(())
    }
}

/// Manifest held in memory. Used for manifests fetched from a remote
/// repository and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryManifestStore {
    document: Map<String, Value>,
}

impl MemoryManifestStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from a raw manifest document.
    pub fn from_bytes(bytes: &[u8]) -> ManifestResult<Self> {
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(document) => Ok(Self { document }),
            _ => Err(ManifestError::NotAnObject {
                path: "<memory>".to_string(),
            }),
        }
    }

    /// Serializes the current document.
    pub fn to_json(&self) -> ManifestResult<String> {
        Ok(serde_json::to_string_pretty(&self.document)?)
    }
}

impl ManifestStore for MemoryManifestStore {
    fn load(&self) -> ManifestMap {
        typed_entries(self.document.clone())
    }

    fn upsert(&mut self, key: &ResourceKey, entry: &ManifestEntry) -> ManifestResult<()> {
        merge_entry(&mut self.document, key, entry)
    }
}
