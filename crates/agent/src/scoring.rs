//! Lead Scoring
//!
//! Additive, config-driven scoring:
//! - Each intent carries a weight, added only when the intent differs from
//!   the previous turn's intent (repeating a question earns nothing)
//! - Negative phrases subtract their penalty on every occurrence
//! - Rank is derived from the running score with inclusive thresholds
//!
//! The score has no floor; a lead can go below zero.

use lead_agent_config::ScoringConfig;
use lead_agent_core::{ConversationState, Intent, Rank, RankThresholds};
use lead_agent_text_processing::PhraseSet;
use serde::Serialize;

/// What one message did to the score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreUpdate {
    pub previous: i64,
    pub intent_weight: i64,
    pub penalty: i64,
    pub score: i64,
    pub rank: Rank,
    /// Penalty phrases found in the message
    pub matched_penalties: Vec<String>,
}

impl ScoreUpdate {
    pub fn delta(&self) -> i64 {
        self.score - self.previous
    }
}

struct Penalty {
    phrase: String,
    matcher: PhraseSet,
    amount: i64,
}

pub struct LeadScorer {
    config: ScoringConfig,
    penalties: Vec<Penalty>,
}

impl Default for LeadScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl LeadScorer {
    pub fn new(config: ScoringConfig) -> Self {
        let penalties = config
            .negative_signals
            .iter()
            .map(|signal| Penalty {
                phrase: signal.phrase.to_lowercase(),
                matcher: PhraseSet::new([signal.phrase.as_str()]),
                amount: signal.penalty,
            })
            .collect();
        Self { config, penalties }
    }

    pub fn thresholds(&self) -> &RankThresholds {
        &self.config.thresholds
    }

    /// Score a message against the state without mutating it
    pub fn evaluate(&self, state: &ConversationState, intent: Intent, text: &str) -> ScoreUpdate {
        let lowered = text.to_lowercase();

        let intent_weight = if state.last_intent == Some(intent) {
            0
        } else {
            self.config.weight(intent)
        };

        let mut penalty = 0;
        let mut matched_penalties = Vec::new();
        for p in &self.penalties {
            if p.matcher.is_match(&lowered) {
                penalty += p.amount;
                matched_penalties.push(p.phrase.clone());
            }
        }

        let score = state.score + intent_weight - penalty;
        ScoreUpdate {
            previous: state.score,
            intent_weight,
            penalty,
            score,
            rank: Rank::from_score(score, &self.config.thresholds),
            matched_penalties,
        }
    }

    /// Apply the message to `state.score`. The caller records the intent
    /// afterwards so the next message compares against this one.
    pub fn update_score(
        &self,
        state: &mut ConversationState,
        intent: Intent,
        text: &str,
    ) -> ScoreUpdate {
        let update = self.evaluate(state, intent, text);
        state.score = update.score;

        if update.delta() != 0 {
            tracing::debug!(
                phone = %lead_agent_core::mask_phone(&state.phone),
                intent = %intent,
                delta = update.delta(),
                score = update.score,
                rank = update.rank.as_str(),
                "Lead score updated"
            );
        }
        update
    }
}
