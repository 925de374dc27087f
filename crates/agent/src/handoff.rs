//! Handoff decision
//!
//! A conversation is escalated to a human advisor when any of these hold,
//! checked in order:
//! 1. the message is a site visit or callback request
//! 2. the message contains a configured escalation phrase
//! 3. the running score reached the hot threshold

use chrono::Utc;
use lead_agent_config::HandoffConfig;
use lead_agent_core::{ConversationState, HandoffEvent, HandoffReason, Intent, Rank, RankThresholds};
use lead_agent_text_processing::PhraseSet;
use uuid::Uuid;

pub struct HandoffGate {
    phrases: PhraseSet,
    thresholds: RankThresholds,
}

impl HandoffGate {
    pub fn new(config: &HandoffConfig, thresholds: RankThresholds) -> Self {
        Self {
            phrases: PhraseSet::new(&config.phrases),
            thresholds,
        }
    }

    /// Reason to hand off after this message, if any. Expects the score to
    /// already include the message.
    pub fn should_handoff(
        &self,
        state: &ConversationState,
        intent: Intent,
        text: &str,
    ) -> Option<HandoffReason> {
        if state.handoff_done {
            return None;
        }

        if intent.is_high_intent() {
            return Some(HandoffReason::HighIntent { intent });
        }

        let lowered = text.to_lowercase();
        if let Some(phrase) = self.phrases.find(&lowered) {
            return Some(HandoffReason::ExplicitPhrase {
                phrase: phrase.to_string(),
            });
        }

        (state.rank(&self.thresholds) == Rank::Hot).then_some(HandoffReason::HotRank { score: state.score })
    }

    pub fn build_event(&self, state: &ConversationState, reason: HandoffReason, text: &str) -> HandoffEvent {
        HandoffEvent {
            id: Uuid::new_v4(),
            phone: state.phone.clone(),
            reason,
            score: state.score,
            rank: state.rank(&self.thresholds),
            slots: state.slots.clone(),
            language: state.language,
            project_id: state.project_id.clone(),
            trigger_text: text.to_string(),
            created_at: Utc::now(),
        }
    }
}
