//! Reply source selection
//!
//! Turns a funnel directive into text. Delegated replies pass through the
//! guardrails first and fall back to fixed safe replies when generation
//! fails. When a conversation has `stop_questions` set, question sentences
//! are stripped from whatever the source produced.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lead_agent_config::TemplatesConfig;
use lead_agent_core::{ConversationState, GenerativeResponder, Language, ProjectContext};
use lead_agent_llm::{PromptBuilder, PromptMode};
use lead_agent_text_processing::{GuardrailVerdict, Guardrails};
use serde::Serialize;

use super::fixed::{fallback_pool, FixedReply};
use super::renderer::TemplateRenderer;
use crate::funnel::ReplyDirective;

/// Where a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Fixed,
    Template,
    Generated,
    Guardrail,
    Fallback,
}

impl ReplySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplySource::Fixed => "fixed",
            ReplySource::Template => "template",
            ReplySource::Generated => "generated",
            ReplySource::Guardrail => "guardrail",
            ReplySource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedReply {
    pub text: String,
    pub source: ReplySource,
}

impl SelectedReply {
    fn new(text: impl Into<String>, source: ReplySource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    pub fn fallback_used(&self) -> bool {
        self.source == ReplySource::Fallback
    }
}

pub struct ReplySelector {
    renderer: TemplateRenderer,
    guardrails: Guardrails,
    responder: Option<Arc<dyn GenerativeResponder>>,
    /// Used once questions are stopped; defaults to `responder`
    support_responder: Option<Arc<dyn GenerativeResponder>>,
    context_turns: usize,
    fallback_cursor: AtomicUsize,
}

impl ReplySelector {
    pub fn new(templates: Arc<TemplatesConfig>, context_turns: usize) -> Self {
        Self {
            renderer: TemplateRenderer::new(templates),
            guardrails: Guardrails::new(),
            responder: None,
            support_responder: None,
            context_turns,
            fallback_cursor: AtomicUsize::new(0),
        }
    }

    pub fn with_responders(
        mut self,
        responder: Arc<dyn GenerativeResponder>,
        support_responder: Option<Arc<dyn GenerativeResponder>>,
    ) -> Self {
        self.responder = Some(responder);
        self.support_responder = support_responder;
        self
    }

    pub fn has_responder(&self) -> bool {
        self.responder.is_some()
    }

    /// Produce the reply for a directive. `None` only for
    /// [`ReplyDirective::Nothing`].
    pub async fn select(
        &self,
        state: &mut ConversationState,
        directive: ReplyDirective,
        text: &str,
        project: Option<&ProjectContext>,
    ) -> Option<SelectedReply> {
        let language = state.reply_language();

        let reply = match directive {
            ReplyDirective::Nothing => return None,
            ReplyDirective::Literal(literal) => SelectedReply::new(literal, ReplySource::Fixed),
            ReplyDirective::Template { intent, then } => {
                match self.renderer.render(state, intent, project) {
                    Some(rendered) => {
                        let mut parts = vec![rendered.reply];
                        match then {
                            Some(reask) => parts.push(reask),
                            None if !state.stop_questions => parts.extend(rendered.follow_up),
                            None => {}
                        }
                        SelectedReply::new(parts.join(" "), ReplySource::Template)
                    }
                    None => self.delegate(state, text, project).await,
                }
            }
            ReplyDirective::Delegate => self.delegate(state, text, project).await,
        };

        if state.stop_questions {
            return Some(SelectedReply::new(strip_questions(&reply.text, language), reply.source));
        }
        Some(reply)
    }

    async fn delegate(
        &self,
        state: &ConversationState,
        text: &str,
        project: Option<&ProjectContext>,
    ) -> SelectedReply {
        let language = state.reply_language();

        match self.guardrails.check(text) {
            Some(GuardrailVerdict::PersonalOrInternal) => {
                return SelectedReply::new(FixedReply::GuardPersonal.text(language), ReplySource::Guardrail)
            }
            Some(GuardrailVerdict::OffDomain) => {
                return SelectedReply::new(FixedReply::GuardOffDomain.text(language), ReplySource::Guardrail)
            }
            None => {}
        }

        let Some(project) = project else {
            return SelectedReply::new(FixedReply::AskWhichProject.text(language), ReplySource::Fixed);
        };

        let (responder, mode) = if state.stop_questions {
            (
                self.support_responder.as_ref().or(self.responder.as_ref()),
                PromptMode::SupportOnly,
            )
        } else {
            (self.responder.as_ref(), PromptMode::Qualifying)
        };

        let Some(responder) = responder else {
            return self.fallback(language);
        };

        let system_prompt = PromptBuilder::new()
            .language(language)
            .mode(mode)
            .project(Some(project))
            .build();
        let context = state.recent_history(self.context_turns);

        match responder.generate(&system_prompt, &context, text).await {
            Ok(reply) if !reply.trim().is_empty() => {
                SelectedReply::new(reply.trim(), ReplySource::Generated)
            }
            Ok(_) => {
                tracing::warn!(
                    phone = %lead_agent_core::mask_phone(&state.phone),
                    responder = responder.name(),
                    "Empty generated reply, using fallback"
                );
                metrics::counter!("lead_agent_generation_fallbacks_total", "reason" => "empty").increment(1);
                self.fallback(language)
            }
            Err(e) => {
                tracing::warn!(
                    phone = %lead_agent_core::mask_phone(&state.phone),
                    responder = responder.name(),
                    error = %e,
                    "Generation failed, using fallback"
                );
                metrics::counter!("lead_agent_generation_fallbacks_total", "reason" => "error").increment(1);
                self.fallback(language)
            }
        }
    }

    fn fallback(&self, language: Language) -> SelectedReply {
        let pool = fallback_pool(language);
        let n = self.fallback_cursor.fetch_add(1, Ordering::Relaxed);
        SelectedReply::new(pool[n % pool.len()], ReplySource::Fallback)
    }
}

/// Drop every sentence ending in a question mark. Returns the fixed
/// support reply when nothing is left.
pub fn strip_questions(text: &str, language: Language) -> String {
    let mut kept: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let terminator = matches!(c, '.' | '!' | '?' | '।');
        let boundary = chars.peek().map_or(true, |next| next.is_whitespace());
        if terminator && boundary {
            if c != '?' {
                kept.push(current.trim().to_string());
            }
            current.clear();
        }
    }
    if !current.trim().is_empty() {
        kept.push(current.trim().to_string());
    }

    kept.retain(|s| !s.is_empty());
    if kept.is_empty() {
        FixedReply::SupportOnly.text(language).to_string()
    } else {
        kept.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lead_agent_core::{ChatEntry, FunnelStep, Intent};
    use parking_lot::Mutex;

    struct Canned {
        reply: lead_agent_core::Result<String>,
        prompts: Mutex<Vec<String>>,
        contexts: Mutex<Vec<usize>>,
    }

    impl Canned {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
                contexts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(lead_agent_core::Error::Timeout(12_000)),
                prompts: Mutex::new(Vec::new()),
                contexts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl GenerativeResponder for Canned {
        async fn generate(
            &self,
            system_prompt: &str,
            context: &[ChatEntry],
            _user_text: &str,
        ) -> lead_agent_core::Result<String> {
            self.prompts.lock().push(system_prompt.to_string());
            self.contexts.lock().push(context.len());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(lead_agent_core::Error::Timeout(12_000)),
            }
        }
    }

    fn project() -> ProjectContext {
        ProjectContext {
            id: "skyline".to_string(),
            name: "Skyline Residency".to_string(),
            location: "Baner, Pune".to_string(),
            ..Default::default()
        }
    }

    fn selector() -> ReplySelector {
        ReplySelector::new(Arc::new(TemplatesConfig::default()), 6)
    }

    fn ai_state() -> ConversationState {
        let mut state = ConversationState::new("919800000001");
        state.step = FunnelStep::AiMode;
        state.language = Some(Language::English);
        state
    }

    #[test]
    fn test_strip_questions() {
        assert_eq!(
            strip_questions("It has a pool. Want to visit? Prices start at 80.5 lakh.", Language::English),
            "It has a pool. Prices start at 80.5 lakh."
        );
        assert_eq!(
            strip_questions("Shall I book a visit?", Language::English),
            FixedReply::SupportOnly.text(Language::English)
        );
        assert_eq!(strip_questions("Noted", Language::English), "Noted");
    }

    #[tokio::test]
    async fn test_nothing_yields_no_reply() {
        let mut state = ai_state();
        assert!(selector()
            .select(&mut state, ReplyDirective::Nothing, "hi", None)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_template_with_reask_replaces_follow_up() {
        let mut state = ai_state();
        let reply = selector()
            .select(
                &mut state,
                ReplyDirective::Template {
                    intent: Intent::LocationQuery,
                    then: Some("What budget range are you considering?".to_string()),
                },
                "where is it?",
                Some(&project()),
            )
            .await
            .unwrap();
        assert_eq!(reply.source, ReplySource::Template);
        assert!(reply.text.ends_with("What budget range are you considering?"));
        assert_eq!(reply.text.matches('?').count(), 1);
    }

    #[tokio::test]
    async fn test_template_follow_up_dropped_when_questions_stopped() {
        let mut state = ai_state();
        state.stop_questions = true;
        let reply = selector()
            .select(
                &mut state,
                ReplyDirective::Template {
                    intent: Intent::PriceQuery,
                    then: None,
                },
                "price",
                Some(&project()),
            )
            .await
            .unwrap();
        assert!(!reply.text.contains('?'));
    }

    #[tokio::test]
    async fn test_guardrails_run_before_generation() {
        let responder = Canned::ok("generated");
        let sel = selector().with_responders(responder.clone(), None);
        let mut state = ai_state();

        let reply = sel
            .select(&mut state, ReplyDirective::Delegate, "who are you?", Some(&project()))
            .await
            .unwrap();
        assert_eq!(reply.source, ReplySource::Guardrail);

        let reply = sel
            .select(&mut state, ReplyDirective::Delegate, "tell me a joke", Some(&project()))
            .await
            .unwrap();
        assert_eq!(reply.text, FixedReply::GuardOffDomain.text(Language::English));
        assert!(responder.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_missing_project_asks_which() {
        let sel = selector().with_responders(Canned::ok("generated"), None);
        let mut state = ai_state();
        let reply = sel
            .select(&mut state, ReplyDirective::Delegate, "is it ready?", None)
            .await
            .unwrap();
        assert_eq!(reply.text, FixedReply::AskWhichProject.text(Language::English));
    }

    #[tokio::test]
    async fn test_generation_uses_context_window() {
        let responder = Canned::ok("  It is ready by 2026.  ");
        let sel = selector().with_responders(responder.clone(), None);
        let mut state = ai_state();
        for i in 0..10 {
            state.push_history(ChatEntry::user(format!("m{}", i)), 15);
        }

        let reply = sel
            .select(&mut state, ReplyDirective::Delegate, "possession?", Some(&project()))
            .await
            .unwrap();
        assert_eq!(reply.text, "It is ready by 2026.");
        assert_eq!(reply.source, ReplySource::Generated);
        assert_eq!(*responder.contexts.lock(), vec![6]);
        assert!(responder.prompts.lock()[0].contains("Skyline Residency"));
    }

    #[tokio::test]
    async fn test_support_responder_used_when_questions_stopped() {
        let normal = Canned::ok("normal");
        let support = Canned::ok("Possession is in 2026. Shall I book a visit?");
        let sel = selector().with_responders(normal.clone(), Some(support.clone()));
        let mut state = ai_state();
        state.stop_questions = true;

        let reply = sel
            .select(&mut state, ReplyDirective::Delegate, "possession", Some(&project()))
            .await
            .unwrap();
        assert_eq!(reply.text, "Possession is in 2026.");
        assert!(normal.prompts.lock().is_empty());
        assert!(support.prompts.lock()[0].contains("Do NOT ask any question"));
    }

    #[tokio::test]
    async fn test_failures_rotate_fallbacks() {
        let sel = selector().with_responders(Canned::failing(), None);
        let mut state = ai_state();
        let mut texts = Vec::new();
        for _ in 0..2 {
            let reply = sel
                .select(&mut state, ReplyDirective::Delegate, "details", Some(&project()))
                .await
                .unwrap();
            assert!(reply.fallback_used());
            assert!(!reply.text.is_empty());
            texts.push(reply.text);
        }
        assert_ne!(texts[0], texts[1]);
    }

    #[tokio::test]
    async fn test_no_responder_falls_back() {
        let mut state = ai_state();
        let reply = selector()
            .select(&mut state, ReplyDirective::Delegate, "details", Some(&project()))
            .await
            .unwrap();
        assert_eq!(reply.source, ReplySource::Fallback);
    }
}
