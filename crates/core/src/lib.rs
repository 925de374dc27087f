//! Core traits and types for the lead qualification agent
//!
//! This crate provides foundational types used across all other crates:
//! - Conversation state record and its funnel steps
//! - Intent and language enumerations
//! - Lead rank derivation from score
//! - Project facts used for grounded replies
//! - Collaborator traits (responder, sender, handoff sink, store)
//! - Error types

pub mod conversation;
pub mod error;
pub mod intent;
pub mod language;
pub mod message;
pub mod project;
pub mod rank;
pub mod state;
pub mod traits;

pub use conversation::FunnelStep;
pub use error::{Error, Result};
pub use intent::Intent;
pub use language::Language;
pub use message::{DeliveryReceipt, HandoffEvent, HandoffReason, InboundMessage};
pub use project::ProjectContext;
pub use rank::{Rank, RankThresholds};
pub use state::{
    ChatEntry, ConversationState, Sender, Slots, HISTORY_LIMIT, STATE_SCHEMA_VERSION,
};

pub use traits::{ConversationStore, GenerativeResponder, HandoffSink, OutboundSender};

/// Mask a phone number for logging, keeping only the last four digits.
pub fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().collect();
    if digits.len() <= 4 {
        return "*".repeat(digits.len());
    }
    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(digits.len() - 4), tail)
}
