//! Per-phone conversation record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::{FunnelStep, Intent, Language, Rank, RankThresholds};

/// Current record layout. Bump when fields are added or renamed and
/// extend the store's migration accordingly.
pub const STATE_SCHEMA_VERSION: u32 = 2;

/// Hard cap on stored chat entries
pub const HISTORY_LIMIT: usize = 15;

/// Qualification answers collected from the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Slots {
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub visit_time: Option<String>,
}

impl Slots {
    pub fn filled_count(&self) -> usize {
        [
            &self.budget,
            &self.location,
            &self.purpose,
            &self.timeline,
            &self.visit_time,
        ]
        .iter()
        .filter(|slot| slot.is_some())
        .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub sender: Sender,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub at: DateTime<Utc>,
}

impl ChatEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Agent,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// Everything the engine knows about one phone number.
///
/// Rank is not stored: it is derived from `score` on demand with
/// [`ConversationState::rank`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub schema_version: u32,
    pub phone: String,
    pub step: FunnelStep,
    pub language: Option<Language>,
    pub slots: Slots,
    pub score: i64,
    pub intent_history: Vec<Intent>,
    pub last_intent: Option<Intent>,
    pub message_count: u64,
    pub last_message_id: Option<String>,
    /// Bounded window of processed message ids, newest at the back
    pub recent_message_ids: VecDeque<String>,
    /// Never reset once true
    pub handoff_done: bool,
    pub handoff_ack_sent: bool,
    pub stop_questions: bool,
    pub conversation_history: VecDeque<ChatEntry>,
    /// Rotation counter per intent for template replies
    pub template_depth: HashMap<Intent, u32>,
    /// Key into the project catalog
    pub project_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(phone: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            schema_version: STATE_SCHEMA_VERSION,
            phone: phone.into(),
            step: FunnelStep::Intro,
            language: None,
            slots: Slots::default(),
            score: 0,
            intent_history: Vec::new(),
            last_intent: None,
            message_count: 0,
            last_message_id: None,
            recent_message_ids: VecDeque::new(),
            handoff_done: false,
            handoff_ack_sent: false,
            stop_questions: false,
            conversation_history: VecDeque::new(),
            template_depth: HashMap::new(),
            project_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rank(&self, thresholds: &RankThresholds) -> Rank {
        Rank::from_score(self.score, thresholds)
    }

    /// Language to reply in, English until the user picks one
    pub fn reply_language(&self) -> Language {
        self.language.unwrap_or_default()
    }

    /// Whether this message id was already processed
    pub fn has_processed(&self, message_id: &str) -> bool {
        self.last_message_id.as_deref() == Some(message_id)
            || self.recent_message_ids.iter().any(|id| id == message_id)
    }

    /// Remember a processed message id, keeping at most `window` ids
    pub fn record_message_id(&mut self, message_id: &str, window: usize) {
        self.last_message_id = Some(message_id.to_string());
        self.recent_message_ids.push_back(message_id.to_string());
        while self.recent_message_ids.len() > window.max(1) {
            self.recent_message_ids.pop_front();
        }
    }

    /// Append a chat entry, dropping the oldest beyond `limit` (never above
    /// [`HISTORY_LIMIT`])
    pub fn push_history(&mut self, entry: ChatEntry, limit: usize) {
        let cap = limit.clamp(1, HISTORY_LIMIT);
        self.conversation_history.push_back(entry);
        while self.conversation_history.len() > cap {
            self.conversation_history.pop_front();
        }
    }

    /// Last `k` history entries, oldest first
    pub fn recent_history(&self, k: usize) -> Vec<ChatEntry> {
        let skip = self.conversation_history.len().saturating_sub(k);
        self.conversation_history.iter().skip(skip).cloned().collect()
    }

    pub fn record_intent(&mut self, intent: Intent) {
        self.intent_history.push(intent);
        self.last_intent = Some(intent);
    }

    /// Move forward to `next`. Backward or disallowed moves are refused and
    /// leave the step unchanged.
    pub fn advance_to(&mut self, next: FunnelStep) -> bool {
        if self.step.can_transition_to(next) {
            self.step = next;
            true
        } else {
            tracing::warn!(
                from = %self.step,
                to = %next,
                "Refusing funnel transition"
            );
            false
        }
    }

    /// Recovery path for unusable steps. Slots are kept.
    pub fn reset_to_intro(&mut self) {
        self.step = FunnelStep::Intro;
    }

    /// Mark the conversation as handed off. Returns true only the first time.
    pub fn mark_handoff(&mut self) -> bool {
        let first = !self.handoff_done;
        self.handoff_done = true;
        self.stop_questions = true;
        self.step = FunnelStep::Done;
        first
    }

    /// Next rotation index for an intent's template pool, then advance it
    pub fn next_template_depth(&mut self, intent: Intent) -> u32 {
        let depth = self.template_depth.entry(intent).or_insert(0);
        let current = *depth;
        *depth = depth.wrapping_add(1);
        current
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
