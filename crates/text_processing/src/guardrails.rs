//! Deterministic guardrails run before any generative call

use serde::{Deserialize, Serialize};

use crate::PhraseSet;

const PERSONAL_OR_INTERNAL: &[&str] = &[
    "who are you",
    "who made you",
    "real name",
    "your name",
    "where do you live",
    "your email",
    "your phone number",
    "personal details",
    "login details",
    "password",
    "openai",
    "chatgpt",
    "api key",
    "system prompt",
    "your prompt",
    "account details",
    "are you a bot",
    "are you human",
];

const OFF_DOMAIN: &[&str] = &[
    "politics",
    "election",
    "cricket",
    "movie",
    "joke",
    "weather",
    "hack",
    "hacking",
    "bitcoin",
    "crypto",
    "recipe",
    "song",
    "girlfriend",
    "boyfriend",
    "homework",
];

/// Outcome of the guardrail check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailVerdict {
    /// Questions about the assistant itself or internal systems
    PersonalOrInternal,
    /// Topics unrelated to real estate
    OffDomain,
}

#[derive(Debug, Clone)]
pub struct Guardrails {
    personal: PhraseSet,
    off_domain: PhraseSet,
}

impl Default for Guardrails {
    fn default() -> Self {
        Self::new()
    }
}

impl Guardrails {
    pub fn new() -> Self {
        Self {
            personal: PhraseSet::new(PERSONAL_OR_INTERNAL.iter().copied()),
            off_domain: PhraseSet::new(OFF_DOMAIN.iter().copied()),
        }
    }

    /// Personal/internal queries take precedence over off-domain ones
    pub fn check(&self, text: &str) -> Option<GuardrailVerdict> {
        let lowered = text.to_lowercase();
        if self.personal.is_match(&lowered) {
            Some(GuardrailVerdict::PersonalOrInternal)
        } else if self.off_domain.is_match(&lowered) {
            Some(GuardrailVerdict::OffDomain)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personal_queries() {
        let g = Guardrails::new();
        assert_eq!(g.check("Who are you?"), Some(GuardrailVerdict::PersonalOrInternal));
        assert_eq!(
            g.check("share your openai account password"),
            Some(GuardrailVerdict::PersonalOrInternal)
        );
    }

    #[test]
    fn test_off_domain_queries() {
        let g = Guardrails::new();
        assert_eq!(g.check("who won the cricket match"), Some(GuardrailVerdict::OffDomain));
        assert_eq!(g.check("tell me a joke"), Some(GuardrailVerdict::OffDomain));
    }

    #[test]
    fn test_property_questions_pass() {
        let g = Guardrails::new();
        assert_eq!(g.check("what is the price of 3bhk"), None);
        // "hack" must not fire inside other words
        assert_eq!(g.check("is there a shackle-free parking"), None);
    }
}
