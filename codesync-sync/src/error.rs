//! Error types for the sync engine.

use codesync_manifest::ManifestError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while pushing or pulling resources.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A required document or file is missing. Never retried.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Pre-flight analysis or compile check rejected the resource.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// The remote service rejected a request. The message is the service's
    /// own text, shown to the operator as-is.
    #[error("{0}")]
    Remote(String),

    /// Network error.
    #[error("network error: {0}")]
    Transport(String),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Resource identity could not be derived.
    #[error("invalid resource: {0}")]
    Resource(#[from] codesync_types::Error),

    /// Manifest store error.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Returns the remote service's message when this is a remote rejection.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            SyncError::Remote(message) => Some(message),
            _ => None,
        }
    }

    /// Returns true for network-level failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Transport(_))
    }
}
