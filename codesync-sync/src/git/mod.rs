//! Git host access for repository pushes.

mod client;
mod prompt;

pub use client::{GitHostClient, TreeEntry, TreeEntryType};
pub use prompt::{CredentialPrompt, NoCredentialPrompt};
