//! Qualification funnel
//!
//! Each step consumes the message text and its intent, fills slots, moves
//! the conversation forward and returns a [`ReplyDirective`] telling the
//! reply selector what to say. Steps only move forward; handed-off
//! conversations produce nothing.

use std::sync::Arc;

use lead_agent_config::TemplatesConfig;
use lead_agent_core::{ConversationState, FunnelStep, Intent, Language, ProjectContext};
use lead_agent_text_processing::{LanguageDetector, SlotExtractor};

use crate::reply::fixed::{visit_noted, FixedReply};

/// Minimum characters for a location answer
const MIN_LOCATION_CHARS: usize = 3;

/// Answers that accept the default language
const LANGUAGE_ACCEPT: &[&str] = &["ok", "okay", "yes", "y", "sure", "fine"];

/// Answers declining a visit
const VISIT_DECLINE: &[&str] = &[
    "no", "nope", "not now", "later", "no thanks", "not interested", "no need", "nahi", "nahin",
    "baad mein",
];

/// Acknowledgements that carry no visit time
const BARE_ACK: &[&str] = &[
    "ok", "okay", "yes", "y", "sure", "fine", "haan", "ha", "ji", "theek hai", "thik hai",
];

/// Budget answers that are not amounts but still settle the question
const BUDGET_UNDECIDED: &[&str] = &[
    "flexible",
    "not decided",
    "not sure",
    "undecided",
    "depends",
    "no fixed budget",
    "open budget",
    "koi bhi",
    "pata nahi",
    "decide nahi",
];
/// Longer replies are not treated as a non-committal budget
const MAX_UNDECIDED_WORDS: usize = 6;

/// What the reply selector should produce for this turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyDirective {
    /// Fixed text
    Literal(String),
    /// Template for `intent`. When `then` is set it replaces the template's
    /// own follow-up, e.g. to re-ask a qualification question.
    Template {
        intent: Intent,
        then: Option<String>,
    },
    /// Hand the message to the generative responder
    Delegate,
    /// No content (conversation already handed off)
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnelOutcome {
    pub step: FunnelStep,
    pub directive: ReplyDirective,
}

pub struct FunnelStateMachine {
    templates: Arc<TemplatesConfig>,
    extractor: SlotExtractor,
    detector: LanguageDetector,
}

impl FunnelStateMachine {
    pub fn new(templates: Arc<TemplatesConfig>) -> Self {
        Self {
            templates,
            extractor: SlotExtractor::new(),
            detector: LanguageDetector::default(),
        }
    }

    /// Run the current step for one message
    pub fn advance(
        &self,
        state: &mut ConversationState,
        text: &str,
        intent: Intent,
        project: Option<&ProjectContext>,
    ) -> FunnelOutcome {
        if state.handoff_done {
            return FunnelOutcome {
                step: state.step,
                directive: ReplyDirective::Nothing,
            };
        }

        if state.stop_questions && (state.step == FunnelStep::Intro || state.step.is_qualifying()) {
            tracing::info!(
                phone = %lead_agent_core::mask_phone(&state.phone),
                from = %state.step,
                "Questions stopped, switching to support mode"
            );
            state.advance_to(FunnelStep::AiMode);
            return FunnelOutcome {
                step: state.step,
                directive: ReplyDirective::Delegate,
            };
        }

        let directive = match state.step {
            FunnelStep::Intro => self.intro(state),
            FunnelStep::LanguageSelect => self.language_select(state, text),
            FunnelStep::QualifyBudget => self.qualify_budget(state, text, intent),
            FunnelStep::QualifyLocation => self.qualify_location(state, text, intent),
            FunnelStep::Visit => self.visit(state, text, intent, project),
            FunnelStep::Decision => {
                state.advance_to(FunnelStep::AiMode);
                ReplyDirective::Delegate
            }
            FunnelStep::AiMode => ReplyDirective::Delegate,
            FunnelStep::Done => self.done(state, intent),
        };

        FunnelOutcome {
            step: state.step,
            directive,
        }
    }

    fn intro(&self, state: &mut ConversationState) -> ReplyDirective {
        state.advance_to(FunnelStep::LanguageSelect);
        literal(FixedReply::Welcome, state.reply_language())
    }

    fn language_select(&self, state: &mut ConversationState, text: &str) -> ReplyDirective {
        let answer = text.trim().trim_end_matches(['.', '!']).to_lowercase();
        let explicit = Language::from_choice(&answer).or_else(|| {
            LANGUAGE_ACCEPT
                .contains(&answer.as_str())
                .then_some(Language::English)
        });

        let note = match explicit {
            Some(language) => {
                state.language = Some(language);
                FixedReply::LanguageConfirmed
            }
            None => {
                state.language = Some(self.detector.detect(text));
                FixedReply::LanguageAssumed
            }
        };

        state.advance_to(FunnelStep::QualifyBudget);
        let language = state.reply_language();
        ReplyDirective::Literal(format!(
            "{} {}",
            note.text(language),
            FixedReply::AskBudget.text(language)
        ))
    }

    fn qualify_budget(&self, state: &mut ConversationState, text: &str, intent: Intent) -> ReplyDirective {
        let language = state.reply_language();

        if let Some(budget) = self.extractor.extract_budget(text) {
            state.slots.budget = Some(budget);
            state.advance_to(FunnelStep::QualifyLocation);
            return literal(FixedReply::AskLocation, language);
        }

        if is_question(text, intent, Intent::PriceQuery) {
            return answer_then(intent, FixedReply::AskBudget, language);
        }

        let answer = text.trim().trim_end_matches(['.', '!']);
        if !is_undecided_budget(answer) {
            return literal(FixedReply::RepromptBudget, language);
        }

        // "flexible", "not decided yet": keep the user's words
        state.slots.budget = Some(answer.to_string());
        state.advance_to(FunnelStep::QualifyLocation);
        literal(FixedReply::AskLocation, language)
    }

    fn qualify_location(&self, state: &mut ConversationState, text: &str, intent: Intent) -> ReplyDirective {
        let language = state.reply_language();

        if is_question(text, intent, Intent::LocationQuery) {
            return answer_then(intent, FixedReply::AskLocation, language);
        }

        let answer = text.trim();
        if answer.chars().count() < MIN_LOCATION_CHARS || intent == Intent::Greeting {
            return literal(FixedReply::RepromptLocation, language);
        }

        state.slots.location = Some(answer.to_string());
        state.advance_to(FunnelStep::Visit);
        literal(FixedReply::AskVisit, language)
    }

    fn visit(
        &self,
        state: &mut ConversationState,
        text: &str,
        intent: Intent,
        project: Option<&ProjectContext>,
    ) -> ReplyDirective {
        let language = state.reply_language();
        let answer = text.trim().trim_end_matches(['.', '!']);
        let lowered = answer.to_lowercase();

        let declined = starts_with_any(&lowered, VISIT_DECLINE);
        if !declined && is_question(text, intent, Intent::SiteVisit) {
            return answer_then(intent, FixedReply::AskVisit, language);
        }

        let visit_time = self.extractor.extract_visit_time(answer).or_else(|| {
            let free_text = !declined
                && !answer.is_empty()
                && !answer.contains('?')
                && !BARE_ACK.contains(&lowered.as_str());
            free_text.then(|| answer.to_string())
        });

        let mut parts = Vec::new();
        if let Some(time) = &visit_time {
            parts.push(visit_noted(language, time));
            state.slots.visit_time = Some(time.clone());
        }

        match project {
            Some(project) => {
                parts.push(format!("{}.", project.summary_line()));
                parts.push(FixedReply::AskInterest.text(language).to_string());
            }
            None => parts.push(FixedReply::AskWhichProject.text(language).to_string()),
        }

        state.advance_to(FunnelStep::Decision);
        ReplyDirective::Literal(parts.join(" "))
    }

    fn done(&self, state: &ConversationState, intent: Intent) -> ReplyDirective {
        if self.templates.has_template(intent) {
            ReplyDirective::Template { intent, then: None }
        } else {
            literal(FixedReply::TeamHasDetails, state.reply_language())
        }
    }
}

fn literal(reply: FixedReply, language: Language) -> ReplyDirective {
    ReplyDirective::Literal(reply.text(language).to_string())
}

fn answer_then(intent: Intent, reask: FixedReply, language: Language) -> ReplyDirective {
    ReplyDirective::Template {
        intent,
        then: Some(reask.text(language).to_string()),
    }
}

fn starts_with_any(lowered: &str, phrases: &[&str]) -> bool {
    phrases
        .iter()
        .any(|p| lowered == *p || lowered.starts_with(&format!("{} ", p)))
}

fn is_undecided_budget(answer: &str) -> bool {
    let lowered = answer.to_lowercase();
    LanguageDetector::word_count(&lowered) <= MAX_UNDECIDED_WORDS
        && BUDGET_UNDECIDED.iter().any(|p| lowered.contains(p))
}

/// A project question rather than an answer to the current step. The
/// step's own topic counts as an answer unless it is phrased as a question.
fn is_question(text: &str, intent: Intent, answer_intent: Intent) -> bool {
    intent.is_project_question() && (intent != answer_intent || text.contains('?'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funnel() -> FunnelStateMachine {
        FunnelStateMachine::new(Arc::new(TemplatesConfig::default()))
    }

    fn at(step: FunnelStep) -> ConversationState {
        let mut state = ConversationState::new("919800000001");
        state.step = step;
        state.language = Some(Language::English);
        state
    }

    fn project() -> ProjectContext {
        ProjectContext {
            id: "skyline".to_string(),
            name: "Skyline Residency".to_string(),
            location: "Baner, Pune".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_intro_asks_language() {
        let mut state = ConversationState::new("1");
        let out = funnel().advance(&mut state, "hi", Intent::Greeting, None);
        assert_eq!(out.step, FunnelStep::LanguageSelect);
        match out.directive {
            ReplyDirective::Literal(text) => assert!(text.contains("Which language")),
            other => panic!("unexpected directive {:?}", other),
        }
    }

    #[test]
    fn test_explicit_language_choice() {
        let mut state = ConversationState::new("1");
        state.step = FunnelStep::LanguageSelect;
        let out = funnel().advance(&mut state, "Hinglish", Intent::Unknown, None);
        assert_eq!(state.language, Some(Language::Hinglish));
        assert_eq!(out.step, FunnelStep::QualifyBudget);
    }

    #[test]
    fn test_ok_means_english() {
        let mut state = ConversationState::new("1");
        state.step = FunnelStep::LanguageSelect;
        funnel().advance(&mut state, "ok", Intent::Unknown, None);
        assert_eq!(state.language, Some(Language::English));
    }

    #[test]
    fn test_language_falls_back_to_detection() {
        let mut state = ConversationState::new("1");
        state.step = FunnelStep::LanguageSelect;
        let out = funnel().advance(&mut state, "mujhe ghar chahiye kal dekhna hai", Intent::Unknown, None);
        assert_eq!(state.language, Some(Language::Hindi));
        match out.directive {
            ReplyDirective::Literal(text) => assert!(text.contains("kabhi bhi")),
            other => panic!("unexpected directive {:?}", other),
        }
    }

    #[test]
    fn test_budget_amount_fills_slot() {
        let mut state = at(FunnelStep::QualifyBudget);
        let out = funnel().advance(&mut state, "around 80 lakh", Intent::Unknown, None);
        assert_eq!(state.slots.budget.as_deref(), Some("80 lakh"));
        assert_eq!(out.step, FunnelStep::QualifyLocation);
    }

    #[test]
    fn test_budget_question_answered_then_reasked() {
        let mut state = at(FunnelStep::QualifyBudget);
        let out = funnel().advance(&mut state, "where is it located?", Intent::LocationQuery, None);
        assert_eq!(out.step, FunnelStep::QualifyBudget);
        assert_eq!(
            out.directive,
            ReplyDirective::Template {
                intent: Intent::LocationQuery,
                then: Some(FixedReply::AskBudget.text(Language::English).to_string()),
            }
        );
        assert!(state.slots.budget.is_none());
    }

    #[test]
    fn test_short_budget_reprompts() {
        let mut state = at(FunnelStep::QualifyBudget);
        let out = funnel().advance(&mut state, "k", Intent::Unknown, None);
        assert_eq!(out.step, FunnelStep::QualifyBudget);
        assert_eq!(
            out.directive,
            ReplyDirective::Literal(FixedReply::RepromptBudget.text(Language::English).to_string())
        );
    }

    #[test]
    fn test_acknowledgement_is_not_a_budget() {
        let mut state = at(FunnelStep::QualifyBudget);
        for text in ["ok", "hmm sounds good", "yes please"] {
            let out = funnel().advance(&mut state, text, Intent::Unknown, None);
            assert_eq!(out.step, FunnelStep::QualifyBudget, "{}", text);
            assert_eq!(
                out.directive,
                ReplyDirective::Literal(FixedReply::RepromptBudget.text(Language::English).to_string())
            );
        }
        assert!(state.slots.budget.is_none());
    }

    #[test]
    fn test_undecided_budget_kept_in_users_words() {
        let mut state = at(FunnelStep::QualifyBudget);
        let out = funnel().advance(&mut state, "Not decided yet.", Intent::Unknown, None);
        assert_eq!(state.slots.budget.as_deref(), Some("Not decided yet"));
        assert_eq!(out.step, FunnelStep::QualifyLocation);

        let mut state = at(FunnelStep::QualifyBudget);
        funnel().advance(&mut state, "flexible", Intent::Unknown, None);
        assert_eq!(state.slots.budget.as_deref(), Some("flexible"));
    }

    #[test]
    fn test_location_answer_and_reprompt() {
        let mut state = at(FunnelStep::QualifyLocation);
        let out = funnel().advance(&mut state, "ab", Intent::Unknown, None);
        assert_eq!(out.step, FunnelStep::QualifyLocation);

        let out = funnel().advance(&mut state, "Baner", Intent::Unknown, None);
        assert_eq!(state.slots.location.as_deref(), Some("Baner"));
        assert_eq!(out.step, FunnelStep::Visit);
    }

    #[test]
    fn test_location_keyword_without_question_is_an_answer() {
        let mut state = at(FunnelStep::QualifyLocation);
        let out = funnel().advance(&mut state, "near hinjewadi area", Intent::LocationQuery, None);
        assert_eq!(out.step, FunnelStep::Visit);
        assert_eq!(state.slots.location.as_deref(), Some("near hinjewadi area"));
    }

    #[test]
    fn test_visit_presents_project() {
        let mut state = at(FunnelStep::Visit);
        let out = funnel().advance(&mut state, "Saturday 11am", Intent::Unknown, Some(&project()));
        assert_eq!(state.slots.visit_time.as_deref(), Some("Saturday 11am"));
        assert_eq!(out.step, FunnelStep::Decision);
        match out.directive {
            ReplyDirective::Literal(text) => {
                assert!(text.contains("Saturday 11am"));
                assert!(text.contains("Skyline Residency in Baner, Pune"));
            }
            other => panic!("unexpected directive {:?}", other),
        }
    }

    #[test]
    fn test_visit_without_project_asks_which() {
        let mut state = at(FunnelStep::Visit);
        let out = funnel().advance(&mut state, "not now", Intent::Unknown, None);
        assert!(state.slots.visit_time.is_none());
        assert_eq!(
            out.directive,
            ReplyDirective::Literal(FixedReply::AskWhichProject.text(Language::English).to_string())
        );
    }

    #[test]
    fn test_visit_question_answered_then_reasked() {
        let mut state = at(FunnelStep::Visit);
        let out = funnel().advance(&mut state, "what is the price?", Intent::PriceQuery, Some(&project()));
        assert_eq!(out.step, FunnelStep::Visit);
        assert_eq!(
            out.directive,
            ReplyDirective::Template {
                intent: Intent::PriceQuery,
                then: Some(FixedReply::AskVisit.text(Language::English).to_string()),
            }
        );
        assert!(state.slots.visit_time.is_none());
    }

    #[test]
    fn test_visit_non_answers_leave_slot_empty() {
        for (text, intent) in [
            ("not interested", Intent::Objection),
            ("yes", Intent::Unknown),
            ("Okay!", Intent::Unknown),
            ("can my parents come too?", Intent::Unknown),
        ] {
            let mut state = at(FunnelStep::Visit);
            let out = funnel().advance(&mut state, text, intent, Some(&project()));
            assert!(state.slots.visit_time.is_none(), "{}", text);
            assert_eq!(out.step, FunnelStep::Decision, "{}", text);
        }
    }

    #[test]
    fn test_visit_free_text_kept() {
        let mut state = at(FunnelStep::Visit);
        funnel().advance(&mut state, "after my exams end", Intent::Unknown, Some(&project()));
        assert_eq!(state.slots.visit_time.as_deref(), Some("after my exams end"));
    }

    #[test]
    fn test_decision_and_ai_mode_delegate() {
        let mut state = at(FunnelStep::Decision);
        let out = funnel().advance(&mut state, "tell me more", Intent::Vague, None);
        assert_eq!(out.step, FunnelStep::AiMode);
        assert_eq!(out.directive, ReplyDirective::Delegate);

        let out = funnel().advance(&mut state, "and parking?", Intent::AmenitiesQuery, None);
        assert_eq!(out.step, FunnelStep::AiMode);
        assert_eq!(out.directive, ReplyDirective::Delegate);
    }

    #[test]
    fn test_stop_questions_skips_qualification() {
        let mut state = at(FunnelStep::QualifyBudget);
        state.stop_questions = true;
        let out = funnel().advance(&mut state, "just answer please", Intent::Unknown, None);
        assert_eq!(out.step, FunnelStep::AiMode);
        assert_eq!(out.directive, ReplyDirective::Delegate);
    }

    #[test]
    fn test_done_uses_template_or_fixed() {
        let mut state = at(FunnelStep::Done);
        let out = funnel().advance(&mut state, "price?", Intent::PriceQuery, None);
        assert_eq!(
            out.directive,
            ReplyDirective::Template {
                intent: Intent::PriceQuery,
                then: None
            }
        );
        let out = funnel().advance(&mut state, "ok", Intent::Unknown, None);
        assert_eq!(
            out.directive,
            ReplyDirective::Literal(FixedReply::TeamHasDetails.text(Language::English).to_string())
        );
    }

    #[test]
    fn test_handed_off_produces_nothing() {
        let mut state = at(FunnelStep::AiMode);
        state.mark_handoff();
        let out = funnel().advance(&mut state, "budget 80 lakh", Intent::PriceQuery, None);
        assert_eq!(out.directive, ReplyDirective::Nothing);
        assert_eq!(out.step, FunnelStep::Done);
        assert!(state.slots.budget.is_none());
    }

    #[test]
    fn test_steps_never_move_backward() {
        let mut state = at(FunnelStep::AiMode);
        for (text, intent) in [("hi", Intent::Greeting), ("80 lakh", Intent::Unknown), ("english", Intent::Unknown)] {
            let out = funnel().advance(&mut state, text, intent, None);
            assert_eq!(out.step, FunnelStep::AiMode);
        }
    }
}
