//! Conversation store trait

use async_trait::async_trait;
use std::time::Duration;

use crate::{ConversationState, Result};

/// Keyed storage for conversation records.
///
/// Stores are not required to serialize read-modify-write cycles; callers
/// that mutate state should go through a per-key lease.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Load the record for `phone`, creating a default one if absent
    async fn get_or_create(&self, phone: &str) -> Result<ConversationState>;

    /// Load the record for `phone` without creating it
    async fn get(&self, phone: &str) -> Result<Option<ConversationState>>;

    /// Write the record, keyed by its `phone`
    async fn put(&self, state: &ConversationState) -> Result<()>;

    /// Remove a record, returning whether it existed
    async fn remove(&self, phone: &str) -> Result<bool>;

    /// Drop records untouched for longer than `ttl`, returning how many
    async fn evict_idle(&self, ttl: Duration) -> Result<usize>;

    /// Number of stored records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
