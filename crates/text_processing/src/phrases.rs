//! Word-boundary phrase matching

use regex::Regex;

/// An immutable set of phrases compiled into one alternation.
///
/// Phrases match on word boundaries only, so "visit" does not fire inside
/// "visitor". Input is expected to be lowercased.
#[derive(Debug, Clone)]
pub struct PhraseSet {
    phrases: Vec<String>,
    regex: Option<Regex>,
}

impl PhraseSet {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases: Vec<String> = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        let regex = if phrases.is_empty() {
            None
        } else {
            // Longest first so multi-word phrases win over their prefixes
            let mut ordered: Vec<&String> = phrases.iter().collect();
            ordered.sort_by_key(|p| std::cmp::Reverse(p.len()));
            let alternation = ordered
                .iter()
                .map(|p| regex::escape(p))
                .collect::<Vec<_>>()
                .join("|");
            match Regex::new(&format!(r"\b(?:{})\b", alternation)) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to compile phrase set");
                    None
                }
            }
        };

        Self { phrases, regex }
    }

    /// First matching phrase in `lowered`
    pub fn find<'a>(&self, lowered: &'a str) -> Option<&'a str> {
        self.regex
            .as_ref()
            .and_then(|r| r.find(lowered))
            .map(|m| m.as_str())
    }

    pub fn is_match(&self, lowered: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(lowered))
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}
