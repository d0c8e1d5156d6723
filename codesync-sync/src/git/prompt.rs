//! Interactive credential capture seam.

/// Supplies a replacement token when the git host rejects the current one.
///
/// Implementations may block on terminal input; the client calls them off
/// the async runtime. Returned tokens live in memory only.
pub trait CredentialPrompt: Send + Sync {
    /// Asks for a token for `host`. `None` means the user declined.
    fn prompt_token(&self, host: &str, reason: &str) -> Option<String>;
}

/// Prompt for non-interactive runs: always declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentialPrompt;

impl CredentialPrompt for NoCredentialPrompt {
    fn prompt_token(&self, _host: &str, _reason: &str) -> Option<String> {
        None
    }
}
