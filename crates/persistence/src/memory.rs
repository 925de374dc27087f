//! In-memory conversation store
//!
//! Records are held as JSON documents keyed by phone and decoded through
//! [`migrate`] on every read, so documents imported from older deployments
//! are readable without a separate migration step.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use lead_agent_core::{ConversationState, ConversationStore, Result};
use serde_json::Value;

use crate::migration::{migrate, to_document};

#[derive(Default)]
pub struct InMemoryStore {
    documents: DashMap<String, Value>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw document as-is, e.g. a record exported by an older
    /// deployment. It is migrated when next read.
    pub fn import_document(&self, phone: impl Into<String>, doc: Value) {
        self.documents.insert(phone.into(), doc);
    }

    /// Raw stored document
    pub fn document(&self, phone: &str) -> Option<Value> {
        self.documents.get(phone).map(|doc| doc.value().clone())
    }

    fn last_activity(doc: &Value) -> Option<DateTime<Utc>> {
        doc.get("updated_at")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|at| at.with_timezone(&Utc))
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn get_or_create(&self, phone: &str) -> Result<ConversationState> {
        if let Some(state) = self.get(phone).await? {
            return Ok(state);
        }

        let state = ConversationState::new(phone);
        self.documents
            .entry(phone.to_string())
            .or_insert(to_document(&state)?);
        tracing::debug!(phone = %lead_agent_core::mask_phone(phone), "Created conversation record");
        Ok(state)
    }

    async fn get(&self, phone: &str) -> Result<Option<ConversationState>> {
        let Some(doc) = self.document(phone) else {
            return Ok(None);
        };
        Ok(Some(migrate(doc, phone)?))
    }

    async fn put(&self, state: &ConversationState) -> Result<()> {
        let doc = to_document(state)?;
        self.documents.insert(state.phone.clone(), doc);
        Ok(())
    }

    async fn remove(&self, phone: &str) -> Result<bool> {
        Ok(self.documents.remove(phone).is_some())
    }

    async fn evict_idle(&self, ttl: Duration) -> Result<usize> {
        if ttl.is_zero() {
            return Ok(0);
        }
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return Ok(0);
        };
        let cutoff = Utc::now() - ttl;

        let before = self.documents.len();
        self.documents.retain(|_, doc| {
            Self::last_activity(doc).map_or(true, |at| at >= cutoff)
        });
        Ok(before.saturating_sub(self.documents.len()))
    }

    fn len(&self) -> usize {
        self.documents.len()
    }
}
