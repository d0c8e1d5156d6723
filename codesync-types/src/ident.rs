//! Identifier sanitization.
//!
//! Api names must be valid variable names in the service's scripting
//! language: ASCII alphanumerics and `_`, never starting with a digit.

/// Suffix marker carried by component and plugin api names.
pub const BUNDLE_SUFFIX: &str = "__c";

/// Replaces every non-alphanumeric character with `_` and prepends `_` when
/// the result would start with a digit.
#[must_use]
pub fn sanitize_identifier(raw: &str) -> String {
    let mut out: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Appends [`BUNDLE_SUFFIX`] unless already present.
#[must_use]
pub fn with_bundle_suffix(identifier: &str) -> String {
    if identifier.ends_with(BUNDLE_SUFFIX) {
        identifier.to_string()
    } else {
        format!("{identifier}{BUNDLE_SUFFIX}")
    }
}

/// Strips a trailing [`BUNDLE_SUFFIX`], if any.
#[must_use]
pub fn without_bundle_suffix(identifier: &str) -> &str {
    identifier.strip_suffix(BUNDLE_SUFFIX).unwrap_or(identifier)
}
