//! Core type definitions for codesync.
//!
//! This crate defines the small, transport-agnostic types shared by the
//! manifest store and the sync engine:
//! - Resource kinds (component, plugin, function, class)
//! - Resource keys and identifier sanitization
//! - Server-issued version stamps
//!
//! Nothing in here performs I/O.

mod ident;
mod key;
mod kind;
mod version;

pub use ident::{sanitize_identifier, with_bundle_suffix, without_bundle_suffix, BUNDLE_SUFFIX};
pub use key::ResourceKey;
pub use kind::ResourceKind;
pub use version::VersionStamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unknown resource kind: {0}")]
    UnknownKind(String),

    #[error("invalid resource key: {0}")]
    InvalidKey(String),

    #[error("identifier is empty after sanitization: {0:?}")]
    EmptyIdentifier(String),
}
