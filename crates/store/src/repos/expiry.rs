//! Expiry repository trait.

use crate::error::{StoreError, StoreResult};
use crate::models::PurgedPage;
use async_trait::async_trait;
use txtpages_core::Timestamp;

/// Repository for reclaiming pages nobody reads any more.
#[async_trait]
pub trait ExpiryRepo: Send + Sync {
    /// Delete every page whose `last_read_at` is strictly before `cutoff`.
    async fn purge_read_before(&self, cutoff: Timestamp) -> StoreResult<Vec<PurgedPage>>;

    /// Delete every page unread for longer than `max_age`.
    async fn purge_older_than(&self, max_age: time::Duration) -> StoreResult<Vec<PurgedPage>> {
        if max_age.is_negative() {
            return Err(StoreError::Validation(format!(
                "purge age must not be negative, got {max_age}"
            )));
        }
        match Timestamp::now().checked_sub(max_age) {
            Some(cutoff) => self.purge_read_before(cutoff).await,
            // Cutoff before the representable range: nothing can be that old.
            None => Ok(Vec::new()),
        }
    }
}
