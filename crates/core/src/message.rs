//! Events crossing the engine boundary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Intent, Language, Rank, Slots};

/// A text message received from the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Sender phone number, the conversation key
    pub sender_id: String,
    pub text: String,
    /// Transport message id, the dedup key
    pub message_id: String,
}

impl InboundMessage {
    pub fn new(
        sender_id: impl Into<String>,
        text: impl Into<String>,
        message_id: impl Into<String>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            text: text.into(),
            message_id: message_id.into(),
        }
    }
}

/// Why a conversation was escalated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandoffReason {
    /// Score crossed the hot threshold
    HotRank { score: i64 },
    /// Classified as site visit or callback
    HighIntent { intent: Intent },
    /// Message contained an explicit escalation phrase
    ExplicitPhrase { phrase: String },
}

impl std::fmt::Display for HandoffReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandoffReason::HotRank { score } => write!(f, "hot rank (score {score})"),
            HandoffReason::HighIntent { intent } => write!(f, "high intent ({intent})"),
            HandoffReason::ExplicitPhrase { phrase } => write!(f, "phrase \"{phrase}\""),
        }
    }
}

/// Notification handed to the lead-management side, once per conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffEvent {
    pub id: Uuid,
    pub phone: String,
    pub reason: HandoffReason,
    pub score: i64,
    pub rank: Rank,
    pub slots: Slots,
    pub language: Option<Language>,
    pub project_id: Option<String>,
    /// Message that triggered the handoff
    pub trigger_text: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful outbound send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeliveryReceipt {
    /// Provider-side id, when the provider returns one
    pub provider_message_id: Option<String>,
}
