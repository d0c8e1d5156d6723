//! Classification of remote failure messages.
//!
//! The remote service reports failures as free text with no error codes.
//! Messages are matched against an ordered rule table, first match wins.
//! Anything unmatched is terminal: unknown errors are never retried.

/// Category of a remote push failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// A resource with the same api name already exists on the server.
    DuplicateIdentifier,
    /// The server holds a newer version than the one submitted.
    StaleVersion,
    /// Transient server-side fault.
    TransientSystemFault,
    /// The server no longer knows the version or resource referenced.
    ResourceNotFound,
    /// Anything else. Surfaced to the operator unchanged.
    Terminal,
}

impl FailureCategory {
    /// Whether a recovery action exists for this category.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FailureCategory::Terminal)
    }
}

/// Ordered `(fragments, category)` rules. Fragments are lowercase and must
/// all appear, in order, in the lowercased message.
///
/// The resource-missing rules are anchored to the version/code wording so
/// that other "not found" texts (a missing file token, an unknown binding
/// object) stay terminal.
pub const CLASSIFICATION_RULES: &[(&[&str], FailureCategory)] = &[
    (&["already exists with same api name"], FailureCategory::DuplicateIdentifier),
    (&["current code online has a higher version"], FailureCategory::StaleVersion),
    (&["system exception"], FailureCategory::TransientSystemFault),
    (&["version", "does not exist"], FailureCategory::ResourceNotFound),
    (&["code not found"], FailureCategory::ResourceNotFound),
];

/// Classifies a remote failure message.
pub fn classify(message: &str) -> FailureCategory {
    let lowered = message.to_lowercase();
    CLASSIFICATION_RULES
        .iter()
        .find(|(fragments, _)| matches_in_order(&lowered, fragments))
        .map(|(_, category)| *category)
        .unwrap_or(FailureCategory::Terminal)
}

fn matches_in_order(message: &str, fragments: &[&str]) -> bool {
    let mut rest = message;
    for fragment in fragments {
        match rest.find(fragment) {
            Some(at) => rest = &rest[at + fragment.len()..],
            None => return false,
        }
    }
    true
}
