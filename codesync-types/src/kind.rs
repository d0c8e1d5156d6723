//! The four resource kinds the engine synchronizes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of code artifact held by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// UI component bundle (`component.xml` + files).
    Component,
    /// UI plugin bundle (`plugin.xml` + files).
    Plugin,
    /// Serverless function (single Groovy script).
    Function,
    /// Server-side class (single Groovy script).
    Class,
}

impl ResourceKind {
    /// Every kind, in batch order.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Component,
        ResourceKind::Plugin,
        ResourceKind::Function,
        ResourceKind::Class,
    ];

    /// Lowercase wire name, also used as the manifest key prefix.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Component => "component",
            ResourceKind::Plugin => "plugin",
            ResourceKind::Function => "function",
            ResourceKind::Class => "class",
        }
    }

    /// Fixed-name metadata document required at the resource root, if any.
    #[must_use]
    pub const fn metadata_document(&self) -> Option<&'static str> {
        match self {
            ResourceKind::Component => Some("component.xml"),
            ResourceKind::Plugin => Some("plugin.xml"),
            ResourceKind::Function | ResourceKind::Class => None,
        }
    }

    /// Whether resources of this kind are directory bundles (component/plugin)
    /// rather than single script files.
    #[must_use]
    pub const fn is_bundle(&self) -> bool {
        matches!(self, ResourceKind::Component | ResourceKind::Plugin)
    }

    /// Whether the api name carries the bundle suffix marker.
    #[must_use]
    pub const fn carries_suffix(&self) -> bool {
        self.is_bundle()
    }

    /// Whether the static-analysis and compile-check calls run before upload.
    #[must_use]
    pub const fn requires_preflight(&self) -> bool {
        matches!(self, ResourceKind::Function | ResourceKind::Class)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "component" => Ok(ResourceKind::Component),
            "plugin" => Ok(ResourceKind::Plugin),
            "function" => Ok(ResourceKind::Function),
            "class" => Ok(ResourceKind::Class),
            other => Err(crate::Error::UnknownKind(other.to_string())),
        }
    }
}
