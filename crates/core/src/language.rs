//! Reply languages supported by the agent

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language a conversation is held in.
///
/// Hindi replies are written in romanized script; Hinglish mixes English
/// sentences with common Hindi words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Hinglish,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Hindi => "hindi",
            Language::Hinglish => "hinglish",
        }
    }

    /// Parse an explicit answer to the language question.
    ///
    /// Accepts full names, short aliases and menu numbers. Returns `None`
    /// when the answer is not a language choice.
    pub fn from_choice(answer: &str) -> Option<Language> {
        let answer = answer.trim().trim_end_matches(['.', '!']).to_lowercase();
        match answer.as_str() {
            "english" | "eng" | "en" | "1" => Some(Language::English),
            "hindi" | "hin" | "2" | "हिंदी" | "हिन्दी" => Some(Language::Hindi),
            "hinglish" | "mix" | "mixed" | "3" => Some(Language::Hinglish),
            _ => None,
        }
    }

    /// Instruction appended to generative prompts
    pub fn prompt_hint(&self) -> &'static str {
        match self {
            Language::English => "Reply in simple English.",
            Language::Hindi => "Reply in Hindi written in Roman script.",
            Language::Hinglish => "Reply in natural Hinglish (mix of Hindi and English).",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "hindi" | "hi" => Ok(Language::Hindi),
            "hinglish" => Ok(Language::Hinglish),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_choice_aliases() {
        assert_eq!(Language::from_choice("English"), Some(Language::English));
        assert_eq!(Language::from_choice(" hin "), Some(Language::Hindi));
        assert_eq!(Language::from_choice("mix"), Some(Language::Hinglish));
        assert_eq!(Language::from_choice("2"), Some(Language::Hindi));
        assert_eq!(Language::from_choice("tell me the price"), None);
        // "hi" is a greeting, not a language choice
        assert_eq!(Language::from_choice("hi"), None);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Language::Hinglish).unwrap();
        assert_eq!(json, "\"hinglish\"");
        let parsed: Language = serde_json::from_str("\"hindi\"").unwrap();
        assert_eq!(parsed, Language::Hindi);
    }
}
