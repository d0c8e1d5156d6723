//! Terminal credential prompt.

use codesync_sync::CredentialPrompt;
use inquire::{Password, PasswordDisplayMode};
use tracing::warn;

/// Asks for a replacement git host token on the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn prompt_token(&self, host: &str, reason: &str) -> Option<String> {
        warn!("Authentication required at {host} ({reason})");
        let message = format!("Access token for {host}:");
        match Password::new(&message)
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()
        {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("No token entered: {}", e);
                None
            }
        }
    }
}
