//! Per-phone serialization of read-modify-write cycles
//!
//! A [`StateLease`] holds the phone's async lock from load until it is
//! committed or dropped. Duplicate deliveries for the same phone therefore
//! observe each other's commits, and replies for a phone go out in order.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use lead_agent_core::{ConversationState, ConversationStore, Result};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Store wrapper handing out per-phone leases
pub struct KeyedStateStore {
    store: Arc<dyn ConversationStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedStateStore {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    fn lock_for(&self, phone: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(phone.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to `phone` and load its record
    pub async fn lease(&self, phone: &str) -> Result<StateLease> {
        let guard = self.lock_for(phone).lock_owned().await;
        let state = self.store.get_or_create(phone).await?;
        Ok(StateLease {
            state,
            store: Arc::clone(&self.store),
            _guard: guard,
        })
    }

    /// Apply `f` to the record under the phone's lease and persist it
    pub async fn atomic_update<F, R>(&self, phone: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut ConversationState) -> R,
    {
        let mut lease = self.lease(phone).await?;
        let result = f(&mut *lease);
        lease.commit().await?;
        Ok(result)
    }

    /// Read without taking the lease
    pub async fn snapshot(&self, phone: &str) -> Result<Option<ConversationState>> {
        self.store.get(phone).await
    }

    /// Evict idle records, then drop locks nobody holds
    pub async fn evict_idle(&self, ttl: Duration) -> Result<usize> {
        let evicted = self.store.evict_idle(ttl).await?;
        let pruned = self.prune_idle_locks();
        if evicted > 0 {
            tracing::info!(evicted, pruned, remaining = self.store.len(), "Evicted idle conversations");
        }
        Ok(evicted)
    }

    /// Remove lock entries that are neither held nor awaited
    pub fn prune_idle_locks(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }

    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }
}

/// Exclusive, loaded record for one phone.
///
/// Changes are persisted only by [`StateLease::commit`]; dropping the lease
/// discards them and releases the lock.
pub struct StateLease {
    state: ConversationState,
    store: Arc<dyn ConversationStore>,
    _guard: OwnedMutexGuard<()>,
}

impl StateLease {
    /// Persist the record. The lock is held until the lease is dropped.
    pub async fn commit(&mut self) -> Result<()> {
        self.state.touch();
        self.store.put(&self.state).await
    }

    pub fn into_state(self) -> ConversationState {
        self.state
    }
}

impl Deref for StateLease {
    type Target = ConversationState;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl DerefMut for StateLease {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryStore;

    fn keyed() -> KeyedStateStore {
        KeyedStateStore::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn test_uncommitted_changes_are_discarded() {
        let store = keyed();
        {
            let mut lease = store.lease("111").await.unwrap();
            lease.score = 99;
        }
        let state = store.snapshot("111").await.unwrap().unwrap();
        assert_eq!(state.score, 0);
    }

    #[tokio::test]
    async fn test_commit_persists() {
        let store = keyed();
        let mut lease = store.lease("111").await.unwrap();
        lease.score = 42;
        lease.commit().await.unwrap();
        drop(lease);
        assert_eq!(store.snapshot("111").await.unwrap().unwrap().score, 42);
    }

    #[tokio::test]
    async fn test_atomic_update_returns_value() {
        let store = keyed();
        let score = store
            .atomic_update("111", |s| {
                s.score += 5;
                s.score
            })
            .await
            .unwrap();
        assert_eq!(score, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_are_serialized() {
        let store = Arc::new(keyed());
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let mut lease = store.lease("111").await.unwrap();
                let current = lease.score;
                tokio::task::yield_now().await;
                lease.score = current + 1;
                lease.commit().await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.snapshot("111").await.unwrap().unwrap().score, 50);
    }

    #[tokio::test]
    async fn test_prune_keeps_held_locks() {
        let store = keyed();
        let held = store.lease("111").await.unwrap();
        drop(store.lease("222").await.unwrap());
        assert_eq!(store.lock_count(), 2);
        assert_eq!(store.prune_idle_locks(), 1);
        assert_eq!(store.lock_count(), 1);
        drop(held);
    }
}
