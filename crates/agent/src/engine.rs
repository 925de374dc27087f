//! Conversation engine
//!
//! Runs one inbound message through the whole turn while holding the
//! phone's lease: dedup, classification, language adaptation, slot
//! filling, scoring, handoff, funnel, reply selection, commit and the
//! single outbound send.

use std::sync::Arc;
use std::time::Instant;

use lead_agent_config::{PostHandoffPolicy, ProjectCatalog, Settings};
use lead_agent_core::{
    mask_phone, ChatEntry, ConversationState, FunnelStep, GenerativeResponder, HandoffReason,
    HandoffSink, InboundMessage, Language, OutboundSender, ProjectContext, RankThresholds,
};
use lead_agent_persistence::KeyedStateStore;
use lead_agent_text_processing::{IntentClassifier, LanguageDetector, PhraseSet, SlotExtractor};
use serde::Serialize;

use crate::funnel::FunnelStateMachine;
use crate::handoff::HandoffGate;
use crate::reply::{FixedReply, ReplySelector, ReplySource};
use crate::scoring::LeadScorer;
use crate::AgentError;

/// Per-conversation limits, taken from [`Settings`]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub history_limit: usize,
    pub context_turns: usize,
    pub dedup_window: usize,
    pub post_handoff: PostHandoffPolicy,
    pub min_words_for_language_switch: usize,
    pub irritation_phrases: Vec<String>,
}

impl EngineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let c = &settings.conversation;
        Self {
            history_limit: c.history_limit,
            context_turns: c.context_turns,
            dedup_window: c.dedup_window,
            post_handoff: c.post_handoff,
            min_words_for_language_switch: c.min_words_for_language_switch,
            irritation_phrases: c.irritation_phrases.clone(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// What happened to one inbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Message id already processed; nothing changed, nothing sent
    Duplicate,
    /// Processed without a reply (empty text, or after handoff)
    Silent,
    Replied {
        text: String,
        source: ReplySource,
        delivered: bool,
    },
    /// This message triggered the handoff
    HandedOff {
        text: String,
        reason: HandoffReason,
        delivered: bool,
    },
}

impl TurnOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            TurnOutcome::Duplicate => "duplicate",
            TurnOutcome::Silent => "silent",
            TurnOutcome::Replied { .. } => "replied",
            TurnOutcome::HandedOff { .. } => "handed_off",
        }
    }

    pub fn reply_text(&self) -> Option<&str> {
        match self {
            TurnOutcome::Replied { text, .. } | TurnOutcome::HandedOff { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn fallback_used(&self) -> bool {
        matches!(
            self,
            TurnOutcome::Replied {
                source: ReplySource::Fallback,
                ..
            }
        )
    }
}

pub struct ConversationEngine {
    config: EngineConfig,
    states: Arc<KeyedStateStore>,
    catalog: Arc<ProjectCatalog>,
    classifier: IntentClassifier,
    detector: LanguageDetector,
    extractor: SlotExtractor,
    scorer: LeadScorer,
    gate: HandoffGate,
    funnel: FunnelStateMachine,
    selector: ReplySelector,
    irritation: PhraseSet,
    sender: Arc<dyn OutboundSender>,
    sink: Arc<dyn HandoffSink>,
}

impl ConversationEngine {
    pub fn new(
        settings: &Settings,
        catalog: Arc<ProjectCatalog>,
        states: Arc<KeyedStateStore>,
        sender: Arc<dyn OutboundSender>,
        sink: Arc<dyn HandoffSink>,
    ) -> Self {
        let config = EngineConfig::from_settings(settings);
        let templates = Arc::new(settings.templates.clone());
        Self {
            irritation: PhraseSet::new(&config.irritation_phrases),
            selector: ReplySelector::new(Arc::clone(&templates), config.context_turns),
            funnel: FunnelStateMachine::new(templates),
            scorer: LeadScorer::new(settings.scoring.clone()),
            gate: HandoffGate::new(&settings.handoff, settings.scoring.thresholds),
            classifier: IntentClassifier::new(),
            detector: LanguageDetector::default(),
            extractor: SlotExtractor::new(),
            config,
            states,
            catalog,
            sender,
            sink,
        }
    }

    /// Attach generative responders. `support` serves conversations that
    /// stopped asking questions; `responder` is used when it is `None`.
    pub fn with_responders(
        mut self,
        responder: Arc<dyn GenerativeResponder>,
        support: Option<Arc<dyn GenerativeResponder>>,
    ) -> Self {
        self.selector = self.selector.with_responders(responder, support);
        self
    }

    pub fn states(&self) -> &Arc<KeyedStateStore> {
        &self.states
    }

    pub fn thresholds(&self) -> &RankThresholds {
        self.scorer.thresholds()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Process one inbound message end to end
    #[tracing::instrument(
        name = "turn",
        skip(self, message),
        fields(phone = %mask_phone(&message.sender_id), message_id = %message.message_id)
    )]
    pub async fn handle(&self, message: InboundMessage) -> Result<TurnOutcome, AgentError> {
        let started = Instant::now();
        let result = self.run_turn(&message).await;

        metrics::histogram!("lead_agent_turn_duration_seconds").record(started.elapsed().as_secs_f64());
        match &result {
            Ok(outcome) => {
                metrics::counter!("lead_agent_messages_total", "outcome" => outcome.kind()).increment(1);
            }
            Err(e) => {
                metrics::counter!("lead_agent_messages_total", "outcome" => "error").increment(1);
                tracing::error!(error = %e, "Turn failed");
            }
        }
        result
    }

    async fn run_turn(&self, message: &InboundMessage) -> Result<TurnOutcome, AgentError> {
        let phone = message.sender_id.trim();
        if phone.is_empty() {
            return Err(AgentError::InvalidMessage("sender id is empty".to_string()));
        }
        if message.message_id.trim().is_empty() {
            return Err(AgentError::InvalidMessage("message id is empty".to_string()));
        }
        let text = message.text.trim();
        if text.is_empty() {
            tracing::debug!("Ignoring message without text");
            return Ok(TurnOutcome::Silent);
        }

        let mut lease = self.states.lease(phone).await?;

        if lease.has_processed(&message.message_id) {
            tracing::debug!("Duplicate delivery ignored");
            metrics::counter!("lead_agent_duplicate_deliveries_total").increment(1);
            return Ok(TurnOutcome::Duplicate);
        }
        lease.record_message_id(&message.message_id, self.config.dedup_window);
        lease.message_count += 1;

        if lease.handoff_done {
            let reply = self.after_handoff(&mut lease);
            lease.push_history(ChatEntry::user(text), self.config.history_limit);
            if let Some(reply) = reply {
                lease.push_history(ChatEntry::agent(reply), self.config.history_limit);
            }
            lease.commit().await?;
            return Ok(match reply {
                Some(reply) => TurnOutcome::Replied {
                    text: reply.to_string(),
                    source: ReplySource::Fixed,
                    delivered: self.deliver(phone, reply).await,
                },
                None => TurnOutcome::Silent,
            });
        }

        let intent = self.classifier.detect(text);
        self.adapt_language(&mut lease, text);
        self.extractor.fill_opportunistic(&mut lease.slots, text);
        let project = self.resolve_project(&mut lease, text);

        let update = self.scorer.update_score(&mut lease, intent, text);
        lease.record_intent(intent);

        let lowered = text.to_lowercase();
        if !lease.stop_questions && self.irritation.is_match(&lowered) {
            tracing::info!("User asked to stop questions");
            lease.stop_questions = true;
        }

        if let Some(reason) = self.gate.should_handoff(&lease, intent, text) {
            lease.mark_handoff();
            let reply = FixedReply::HandoffAck.text(lease.reply_language());
            self.record_exchange(&mut lease, text, reply);
            lease.commit().await?;

            let event = self.gate.build_event(&lease, reason.clone(), text);
            tracing::info!(
                intent = %intent,
                score = update.score,
                rank = update.rank.as_str(),
                reason = %reason,
                "Handing off lead"
            );
            metrics::counter!("lead_agent_handoffs_total", "reason" => reason_kind(&reason)).increment(1);
            if let Err(e) = self.sink.notify(&event).await {
                tracing::error!(error = %e, handoff_id = %event.id, "Handoff sink failed");
            }

            return Ok(TurnOutcome::HandedOff {
                text: reply.to_string(),
                reason,
                delivered: self.deliver(phone, reply).await,
            });
        }

        let from = lease.step;
        let outcome = self.funnel.advance(&mut lease, text, intent, project);
        let Some(reply) = self
            .selector
            .select(&mut lease, outcome.directive, text, project)
            .await
        else {
            lease.push_history(ChatEntry::user(text), self.config.history_limit);
            lease.commit().await?;
            return Ok(TurnOutcome::Silent);
        };

        self.record_exchange(&mut lease, text, &reply.text);
        lease.commit().await?;

        tracing::info!(
            intent = %intent,
            from = %from,
            step = %outcome.step,
            score = update.score,
            rank = update.rank.as_str(),
            source = reply.source.as_str(),
            "Turn processed"
        );
        if reply.fallback_used() {
            metrics::counter!("lead_agent_reply_fallbacks_total").increment(1);
        }

        let delivered = self.deliver(phone, &reply.text).await;
        Ok(TurnOutcome::Replied {
            text: reply.text,
            source: reply.source,
            delivered,
        })
    }

    /// History is written after the reply so the responder's context window
    /// never contains the message it is answering
    fn record_exchange(&self, state: &mut ConversationState, user_text: &str, reply: &str) {
        state.push_history(ChatEntry::user(user_text), self.config.history_limit);
        state.push_history(ChatEntry::agent(reply), self.config.history_limit);
    }

    /// Reply for a conversation already handed off, if the policy allows one
    fn after_handoff(&self, state: &mut ConversationState) -> Option<&'static str> {
        match self.config.post_handoff {
            PostHandoffPolicy::Silent => None,
            PostHandoffPolicy::AcknowledgeOnce if state.handoff_ack_sent => None,
            PostHandoffPolicy::AcknowledgeOnce => {
                state.handoff_ack_sent = true;
                Some(FixedReply::PostHandoffAck.text(state.reply_language()))
            }
        }
    }

    /// Follow the user's language once it has been chosen. A switch back to
    /// English needs a message long enough to be a reliable signal.
    fn adapt_language(&self, state: &mut ConversationState, text: &str) {
        if matches!(state.step, FunnelStep::Intro | FunnelStep::LanguageSelect) {
            return;
        }
        let current = state.reply_language();
        let detected = self.detector.detect(text);
        if detected == current {
            return;
        }
        let enough_signal = detected != Language::English
            || LanguageDetector::word_count(text) >= self.config.min_words_for_language_switch;
        if enough_signal {
            tracing::debug!(from = %current, to = %detected, "Switching conversation language");
            state.language = Some(detected);
        }
    }

    /// Project named in the text, else the conversation's project, else the
    /// catalog default
    fn resolve_project(&self, state: &mut ConversationState, text: &str) -> Option<&ProjectContext> {
        let lowered = text.to_lowercase();
        if let Some(project) = self.catalog.find_mentioned(&lowered) {
            state.project_id = Some(project.id.clone());
            return Some(project);
        }
        if let Some(project) = state.project_id.as_deref().and_then(|id| self.catalog.get(id)) {
            return Some(project);
        }
        let project = self.catalog.default_project()?;
        state.project_id = Some(project.id.clone());
        Some(project)
    }

    /// Send once. Failures are logged and reported as undelivered.
    async fn deliver(&self, phone: &str, text: &str) -> bool {
        match self.sender.send(phone, text).await {
            Ok(receipt) => {
                tracing::debug!(provider_id = ?receipt.provider_message_id, "Reply delivered");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reply delivery failed");
                metrics::counter!("lead_agent_delivery_failures_total").increment(1);
                false
            }
        }
    }
}

fn reason_kind(reason: &HandoffReason) -> &'static str {
    match reason {
        HandoffReason::HotRank { .. } => "hot_rank",
        HandoffReason::HighIntent { .. } => "high_intent",
        HandoffReason::ExplicitPhrase { .. } => "explicit_phrase",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lead_agent_core::{DeliveryReceipt, Intent};
    use lead_agent_persistence::{InMemoryStore, LogHandoffSink};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Outbox(Mutex<Vec<(String, String)>>);

    #[async_trait]
    impl OutboundSender for Outbox {
        async fn send(&self, recipient: &str, text: &str) -> lead_agent_core::Result<DeliveryReceipt> {
            self.0.lock().push((recipient.to_string(), text.to_string()));
            Ok(DeliveryReceipt::default())
        }
    }

    fn engine_with(settings: Settings, catalog: ProjectCatalog) -> (ConversationEngine, Arc<Outbox>) {
        let outbox = Arc::new(Outbox::default());
        let engine = ConversationEngine::new(
            &settings,
            Arc::new(catalog),
            Arc::new(KeyedStateStore::new(Arc::new(InMemoryStore::new()))),
            outbox.clone(),
            Arc::new(LogHandoffSink::new()),
        );
        (engine, outbox)
    }

    async fn state_of(engine: &ConversationEngine, phone: &str) -> ConversationState {
        engine.states().snapshot(phone).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_empty_text_is_silent_and_untouched() {
        let (engine, outbox) = engine_with(Settings::default(), ProjectCatalog::default());
        let outcome = engine.handle(InboundMessage::new("111", "   ", "m1")).await.unwrap();
        assert_eq!(outcome, TurnOutcome::Silent);
        assert!(engine.states().snapshot("111").await.unwrap().is_none());
        assert!(outbox.0.lock().is_empty());
    }

    #[tokio::test]
    async fn test_missing_ids_rejected() {
        let (engine, _) = engine_with(Settings::default(), ProjectCatalog::default());
        assert!(matches!(
            engine.handle(InboundMessage::new("", "hi", "m1")).await,
            Err(AgentError::InvalidMessage(_))
        ));
        assert!(matches!(
            engine.handle(InboundMessage::new("111", "hi", " ")).await,
            Err(AgentError::InvalidMessage(_))
        ));
    }

    #[tokio::test]
    async fn test_language_adapts_after_selection() {
        let (engine, _) = engine_with(Settings::default(), ProjectCatalog::default());
        engine.handle(InboundMessage::new("111", "hello", "m1")).await.unwrap();
        engine.handle(InboundMessage::new("111", "english", "m2")).await.unwrap();
        engine
            .handle(InboundMessage::new("111", "mujhe 3bhk ghar chahiye kal", "m3"))
            .await
            .unwrap();
        assert_eq!(state_of(&engine, "111").await.language, Some(Language::Hindi));

        // a short English reply is not enough to switch back
        engine.handle(InboundMessage::new("111", "Baner", "m4")).await.unwrap();
        assert_eq!(state_of(&engine, "111").await.language, Some(Language::Hindi));
    }

    #[tokio::test]
    async fn test_irritation_stops_questions() {
        let (engine, outbox) = engine_with(Settings::default(), ProjectCatalog::default());
        engine.handle(InboundMessage::new("111", "hello", "m1")).await.unwrap();
        engine.handle(InboundMessage::new("111", "english", "m2")).await.unwrap();
        engine
            .handle(InboundMessage::new("111", "too many questions, just answer", "m3"))
            .await
            .unwrap();

        let state = state_of(&engine, "111").await;
        assert!(state.stop_questions);
        assert_eq!(state.step, FunnelStep::AiMode);
        let (_, last) = outbox.0.lock().last().cloned().unwrap();
        assert!(!last.contains('?'));
    }

    #[test]
    fn test_outcome_serializes_with_kind_tag() {
        let replied = TurnOutcome::Replied {
            text: "Which language do you prefer?".to_string(),
            source: ReplySource::Fixed,
            delivered: true,
        };
        let json = serde_json::to_value(&replied).unwrap();
        assert_eq!(json["outcome"], replied.kind());
        assert_eq!(json["source"], "fixed");
        assert_eq!(json["delivered"], true);

        let handed_off = TurnOutcome::HandedOff {
            text: "ok".to_string(),
            reason: HandoffReason::HighIntent {
                intent: Intent::CallbackRequest,
            },
            delivered: false,
        };
        let json = serde_json::to_value(&handed_off).unwrap();
        assert_eq!(json["outcome"], "handed_off");
        assert_eq!(json["reason"]["kind"], "high_intent");
        assert_eq!(json["reason"]["intent"], "callback_request");

        assert_eq!(
            serde_json::to_value(TurnOutcome::Duplicate).unwrap(),
            serde_json::json!({ "outcome": "duplicate" })
        );
    }

    #[tokio::test]
    async fn test_acknowledge_once_after_handoff() {
        let mut settings = Settings::default();
        settings.conversation.post_handoff = PostHandoffPolicy::AcknowledgeOnce;
        let (engine, outbox) = engine_with(settings, ProjectCatalog::default());

        let outcome = engine.handle(InboundMessage::new("111", "please call me", "m1")).await.unwrap();
        assert!(matches!(outcome, TurnOutcome::HandedOff { .. }));

        let second = engine.handle(InboundMessage::new("111", "hello?", "m2")).await.unwrap();
        assert_eq!(
            second.reply_text(),
            Some(FixedReply::PostHandoffAck.text(Language::English))
        );
        let third = engine.handle(InboundMessage::new("111", "anyone?", "m3")).await.unwrap();
        assert_eq!(third, TurnOutcome::Silent);
        assert_eq!(outbox.0.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_project_resolved_from_default() {
        let catalog = ProjectCatalog {
            default_project: None,
            projects: vec![ProjectContext {
                id: "skyline".to_string(),
                name: "Skyline Residency".to_string(),
                ..Default::default()
            }],
        };
        let (engine, _) = engine_with(Settings::default(), catalog);
        engine.handle(InboundMessage::new("111", "hi", "m1")).await.unwrap();
        assert_eq!(state_of(&engine, "111").await.project_id.as_deref(), Some("skyline"));
    }
}
