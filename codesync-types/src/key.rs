//! Resource identity.

use crate::ident::{sanitize_identifier, with_bundle_suffix, without_bundle_suffix};
use crate::kind::ResourceKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a resource on the remote service: `(kind, apiName)`.
///
/// The stored api name is always sanitized. Component and plugin api names
/// carry the bundle suffix; function and class names never do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    kind: ResourceKind,
    api_name: String,
}

impl ResourceKey {
    /// Derives a key from a raw name (directory or file stem), sanitizing it
    /// and applying the kind's suffix rule.
    pub fn from_name(kind: ResourceKind, raw: &str) -> crate::Result<Self> {
        let sanitized = sanitize_identifier(raw);
        if sanitized.is_empty() {
            return Err(crate::Error::EmptyIdentifier(raw.to_string()));
        }

        let api_name = if kind.carries_suffix() {
            with_bundle_suffix(&sanitized)
        } else {
            sanitized
        };

        Ok(Self { kind, api_name })
    }

    /// Returns the resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Returns the full api name (suffix included for bundles).
    #[must_use]
    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    /// Returns the api name with any bundle suffix removed.
    #[must_use]
    pub fn identifier(&self) -> &str {
        if self.kind.carries_suffix() {
            without_bundle_suffix(&self.api_name)
        } else {
            &self.api_name
        }
    }

    /// Manifest key: `"<kind>:<identifier-without-suffix>"`.
    #[must_use]
    pub fn manifest_key(&self) -> String {
        format!("{}:{}", self.kind, self.identifier())
    }

    /// Parses a manifest key back into a resource key.
    pub fn parse_manifest_key(s: &str) -> crate::Result<Self> {
        let (kind, ident) = s
            .split_once(':')
            .ok_or_else(|| crate::Error::InvalidKey(s.to_string()))?;
        let kind = ResourceKind::from_str(kind)?;
        if ident.is_empty() {
            return Err(crate::Error::InvalidKey(s.to_string()));
        }
        Self::from_name(kind, ident)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.api_name)
    }
}

impl FromStr for ResourceKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_manifest_key(s)
    }
}
