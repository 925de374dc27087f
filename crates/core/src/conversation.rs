//! Funnel steps and their allowed transitions

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Steps of the qualification funnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStep {
    /// No message handled yet
    #[default]
    Intro,
    /// Waiting for the user's language choice
    LanguageSelect,
    /// Collecting the budget slot
    QualifyBudget,
    /// Collecting the preferred location
    QualifyLocation,
    /// Asking for a site visit time
    Visit,
    /// Project presented, next reply decides the path
    Decision,
    /// Free-form conversation handled by the generative responder
    AiMode,
    /// Handed off to a human advisor
    Done,
}

/// Forward transitions per step. Staying on the same step is always allowed
/// and the reset-to-intro recovery path bypasses this table.
static STEP_TRANSITIONS: Lazy<HashMap<FunnelStep, &'static [FunnelStep]>> = Lazy::new(|| {
    use FunnelStep::*;
    let mut map = HashMap::new();
    map.insert(Intro, &[LanguageSelect, AiMode, Done] as &[_]);
    map.insert(LanguageSelect, &[QualifyBudget, AiMode, Done] as &[_]);
    map.insert(QualifyBudget, &[QualifyLocation, AiMode, Done] as &[_]);
    map.insert(QualifyLocation, &[Visit, AiMode, Done] as &[_]);
    map.insert(Visit, &[Decision, AiMode, Done] as &[_]);
    map.insert(Decision, &[AiMode, Done] as &[_]);
    map.insert(AiMode, &[Done] as &[_]);
    map.insert(Done, &[] as &[_]);
    map
});

impl FunnelStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunnelStep::Intro => "intro",
            FunnelStep::LanguageSelect => "language_select",
            FunnelStep::QualifyBudget => "qualify_budget",
            FunnelStep::QualifyLocation => "qualify_location",
            FunnelStep::Visit => "visit",
            FunnelStep::Decision => "decision",
            FunnelStep::AiMode => "ai_mode",
            FunnelStep::Done => "done",
        }
    }

    /// Position in the funnel, used to refuse backward moves
    pub fn ordinal(&self) -> u8 {
        match self {
            FunnelStep::Intro => 0,
            FunnelStep::LanguageSelect => 1,
            FunnelStep::QualifyBudget => 2,
            FunnelStep::QualifyLocation => 3,
            FunnelStep::Visit => 4,
            FunnelStep::Decision => 5,
            FunnelStep::AiMode => 6,
            FunnelStep::Done => 7,
        }
    }

    pub fn allowed_transitions(&self) -> &'static [FunnelStep] {
        STEP_TRANSITIONS.get(self).copied().unwrap_or(&[])
    }

    pub fn can_transition_to(&self, target: FunnelStep) -> bool {
        *self == target || self.allowed_transitions().contains(&target)
    }

    /// Steps that still ask qualification questions
    pub fn is_qualifying(&self) -> bool {
        matches!(
            self,
            FunnelStep::LanguageSelect
                | FunnelStep::QualifyBudget
                | FunnelStep::QualifyLocation
                | FunnelStep::Visit
        )
    }

    /// Steps where every reply is delegated to the generative responder
    pub fn is_free_form(&self) -> bool {
        matches!(self, FunnelStep::Decision | FunnelStep::AiMode)
    }

    /// Parse a stored step value, including spellings written by older
    /// record versions. Returns `None` for anything unrecognized.
    pub fn parse_stored(value: &str) -> Option<FunnelStep> {
        match value.trim().to_lowercase().as_str() {
            "intro" | "start" => Some(FunnelStep::Intro),
            "language_select" | "language" => Some(FunnelStep::LanguageSelect),
            "qualify_budget" | "budget" => Some(FunnelStep::QualifyBudget),
            "qualify_location" | "location" => Some(FunnelStep::QualifyLocation),
            "visit" => Some(FunnelStep::Visit),
            "decision" | "project_intro" => Some(FunnelStep::Decision),
            "ai_mode" | "ai" => Some(FunnelStep::AiMode),
            "done" | "handoff" => Some(FunnelStep::Done),
            _ => None,
        }
    }
}

impl std::fmt::Display for FunnelStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_only_move_forward() {
        let steps = [
            FunnelStep::Intro,
            FunnelStep::LanguageSelect,
            FunnelStep::QualifyBudget,
            FunnelStep::QualifyLocation,
            FunnelStep::Visit,
            FunnelStep::Decision,
            FunnelStep::AiMode,
            FunnelStep::Done,
        ];
        for from in steps {
            for to in from.allowed_transitions() {
                assert!(to.ordinal() > from.ordinal(), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_done_is_terminal() {
        assert!(FunnelStep::Done.allowed_transitions().is_empty());
        assert!(!FunnelStep::Done.can_transition_to(FunnelStep::Intro));
        assert!(FunnelStep::Done.can_transition_to(FunnelStep::Done));
    }

    #[test]
    fn test_parse_stored_legacy_values() {
        assert_eq!(FunnelStep::parse_stored("language"), Some(FunnelStep::LanguageSelect));
        assert_eq!(FunnelStep::parse_stored("budget"), Some(FunnelStep::QualifyBudget));
        assert_eq!(FunnelStep::parse_stored("project_intro"), Some(FunnelStep::Decision));
        assert_eq!(FunnelStep::parse_stored("AI_MODE"), Some(FunnelStep::AiMode));
        assert_eq!(FunnelStep::parse_stored("negotiation"), None);
    }
}
