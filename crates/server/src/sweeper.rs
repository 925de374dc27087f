//! Background eviction of idle conversations

use std::sync::Arc;
use std::time::Duration;

use lead_agent_persistence::KeyedStateStore;
use tokio::sync::watch;

/// Periodically evict conversations idle longer than `ttl` and drop
/// per-phone locks nobody holds. A zero `ttl` keeps every conversation
/// but still prunes locks.
///
/// Returns a shutdown sender; sending `true` stops the task.
pub fn start_idle_sweeper(
    states: Arc<KeyedStateStore>,
    ttl: Duration,
    every: Duration,
) -> watch::Sender<bool> {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        let mut interval_timer = tokio::time::interval(every);
        interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval_timer.tick() => {
                    if ttl.is_zero() {
                        let pruned = states.prune_idle_locks();
                        if pruned > 0 {
                            tracing::debug!(pruned, "Pruned idle conversation locks");
                        }
                    } else if let Err(e) = states.evict_idle(ttl).await {
                        tracing::warn!(error = %e, "Idle sweep failed");
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        tracing::info!("Idle sweeper shutting down");
                        break;
                    }
                }
            }
        }
    });

    shutdown_tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use lead_agent_core::ConversationState;
    use lead_agent_persistence::{to_document, InMemoryStore};

    #[tokio::test]
    async fn test_sweeper_evicts_stale_records() {
        let memory = Arc::new(InMemoryStore::new());
        let mut stale = ConversationState::new("919800000001");
        stale.updated_at = chrono::Utc::now() - chrono::Duration::days(30);
        memory.import_document("919800000001", to_document(&stale).unwrap());

        let states = Arc::new(KeyedStateStore::new(memory.clone()));
        let shutdown = start_idle_sweeper(
            Arc::clone(&states),
            Duration::from_secs(7 * 24 * 3600),
            Duration::from_millis(10),
        );

        for _ in 0..50 {
            if memory.document("919800000001").is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(memory.document("919800000001").is_none());

        shutdown.send(true).unwrap();
    }

    #[tokio::test]
    async fn test_zero_ttl_keeps_records_but_prunes_locks() {
        let memory = Arc::new(InMemoryStore::new());
        let states = Arc::new(KeyedStateStore::new(memory.clone()));
        states
            .atomic_update("919800000002", |state| state.score = 10)
            .await
            .unwrap();
        assert_eq!(states.lock_count(), 1);

        let shutdown = start_idle_sweeper(Arc::clone(&states), Duration::ZERO, Duration::from_millis(10));

        for _ in 0..50 {
            if states.lock_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(states.lock_count(), 0);
        assert!(memory.document("919800000002").is_some());

        shutdown.send(true).unwrap();
    }
}
