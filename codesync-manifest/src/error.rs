//! Error types for the manifest store.

use thiserror::Error;

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Errors that can occur while reading or writing a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The manifest document is not a JSON object.
    #[error("manifest at {path} is not a JSON object")]
    NotAnObject { path: String },
}
