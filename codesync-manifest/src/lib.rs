//! Local manifest store for codesync.
//!
//! Records the last-known server version and metadata of every pushed or
//! pulled resource. The store is read before every push and written only
//! after the remote call that advanced the version has succeeded, so an
//! interrupted run leaves it consistent with the last confirmed remote state.

mod entry;
mod error;
mod store;

pub use entry::ManifestEntry;
pub use error::{ManifestError, ManifestResult};
pub use store::{parse_manifest, JsonManifestStore, ManifestMap, ManifestStore, MemoryManifestStore};

/// Default manifest file name at the workspace root.
pub const MANIFEST_FILE_NAME: &str = "codesync.manifest.json";
