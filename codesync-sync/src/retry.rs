//! Conflict-resolution retry engine.
//!
//! One push is a bounded loop: submit, and on a rejection classify the
//! message, apply the category's recovery to the version stamp, and submit
//! again. At most `max_retries + 1` submissions happen per resource.
//!
//! Recovery by category:
//!
//! | category | gate | new version |
//! |---|---|---|
//! | duplicate identifier | ceiling only | server version, else epoch |
//! | stale version | `retries < max_retries` | server version, else epoch |
//! | transient fault | `retries < max_retries` | epoch |
//! | resource not found | `retries < max_retries` | epoch |
//! | terminal | never | n/a |

use crate::classify::{classify, FailureCategory};
use crate::error::{SyncError, SyncResult};
use crate::payload::PushPayload;
use crate::remote::RemoteService;
use codesync_types::{ResourceKey, VersionStamp};
use std::sync::Arc;
use tracing::{debug, warn};

/// A push the service accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushAccepted {
    /// Server-returned version, or the submitted one when the service did
    /// not return any.
    pub version: VersionStamp,
    /// Number of submissions made, including the accepted one.
    pub submissions: u32,
}

/// Submits push requests and recovers from version conflicts.
pub struct ConflictResolver {
    remote: Arc<dyn RemoteService>,
    max_retries: u32,
}

impl ConflictResolver {
    pub fn new(remote: Arc<dyn RemoteService>, max_retries: u32) -> Self {
        Self {
            remote,
            max_retries,
        }
    }

    /// Maximum resubmissions after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Submits `payload`, retrying recoverable rejections.
    ///
    /// A terminal rejection, or one that arrives after the budget is spent,
    /// returns [`SyncError::Remote`] with the service's message unchanged.
    /// Transport and other non-rejection errors are returned immediately.
    pub async fn submit(&self, mut payload: PushPayload) -> SyncResult<PushAccepted> {
        let ceiling = self.max_retries.saturating_add(1);
        let mut submissions = 0u32;

        loop {
            submissions += 1;
            debug!(
                "Submitting {} at version {} (attempt {}/{})",
                payload.key, payload.version, submissions, ceiling
            );

            let message = match self.remote.submit(&payload).await {
                Ok(receipt) => {
                    return Ok(PushAccepted {
                        version: receipt.version.unwrap_or(payload.version),
                        submissions,
                    });
                }
                Err(SyncError::Remote(message)) => message,
                Err(e) => return Err(e),
            };

            let category = classify(&message);
            let retries_used = submissions - 1;
            let permitted = match category {
                FailureCategory::Terminal => false,
                FailureCategory::DuplicateIdentifier => true,
                _ => retries_used < self.max_retries,
            };
            if !permitted || submissions >= ceiling {
                if category.is_recoverable() {
                    warn!(
                        "{}: giving up after {} submission(s) ({:?})",
                        payload.key, submissions, category
                    );
                }
                return Err(SyncError::Remote(message));
            }

            let recovered = self.recover(category, &payload.key).await;
            warn!(
                "{} rejected ({:?}): {}; retrying at version {} (was {})",
                payload.key, category, message, recovered, payload.version
            );
            payload.version = recovered;
        }
    }

    /// Computes the version to resubmit with.
    async fn recover(&self, category: FailureCategory, key: &ResourceKey) -> VersionStamp {
        match category {
            FailureCategory::DuplicateIdentifier | FailureCategory::StaleVersion => {
                match self.remote.lookup(key).await {
                    Ok(Some(resource)) => resource.version,
                    Ok(None) => {
                        debug!("{} not found on server, resetting to epoch", key);
                        VersionStamp::EPOCH
                    }
                    Err(e) => {
                        warn!("Version lookup for {} failed, resetting to epoch: {}", key, e);
                        VersionStamp::EPOCH
                    }
                }
            }
            FailureCategory::TransientSystemFault
            | FailureCategory::ResourceNotFound
            | FailureCategory::Terminal => VersionStamp::EPOCH,
        }
    }
}
