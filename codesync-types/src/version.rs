//! Server-issued optimistic-concurrency stamps.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic version stamp (`updateTime`) issued by the remote service.
///
/// The client never fabricates one: values come either from a server
/// response or from [`VersionStamp::EPOCH`] during conflict recovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionStamp(i64);

impl VersionStamp {
    /// The "unknown / brand new" stamp submitted for first pushes and
    /// epoch-reset recovery.
    pub const EPOCH: VersionStamp = VersionStamp(0);

    /// Wraps a server-provided value.
    #[must_use]
    pub const fn from_server(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }

    /// Returns true for [`VersionStamp::EPOCH`].
    #[must_use]
    pub const fn is_epoch(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for VersionStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
