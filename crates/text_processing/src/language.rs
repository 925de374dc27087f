//! Language detection by vocabulary hits

use lead_agent_core::Language;
use unicode_segmentation::UnicodeSegmentation;

use crate::hindi;

/// Hits at or above this classify as Hindi
pub const HINDI_MIN_HITS: usize = 4;
/// Hits at or above this (and below Hindi) classify as Hinglish
pub const HINGLISH_MIN_HITS: usize = 2;

/// Detect the language of a message with the default thresholds
pub fn detect_language(text: &str) -> Language {
    LanguageDetector::default().detect(text)
}

/// Counts Hindi vocabulary words and maps the count to a language
#[derive(Debug, Clone, Copy)]
pub struct LanguageDetector {
    hindi_min_hits: usize,
    hinglish_min_hits: usize,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self {
            hindi_min_hits: HINDI_MIN_HITS,
            hinglish_min_hits: HINGLISH_MIN_HITS,
        }
    }
}

impl LanguageDetector {
    pub fn detect(&self, text: &str) -> Language {
        let hits = self.count_hits(text);
        if hits >= self.hindi_min_hits {
            Language::Hindi
        } else if hits >= self.hinglish_min_hits {
            Language::Hinglish
        } else {
            Language::English
        }
    }

    /// One hit per word token that is romanized Hindi or Devanagari
    pub fn count_hits(&self, text: &str) -> usize {
        let lowered = text.to_lowercase();
        lowered
            .unicode_words()
            .filter(|word| hindi::is_romanized_hindi(word) || hindi::is_devanagari(word))
            .count()
    }

    /// Number of word tokens, used to decide if a message carries enough
    /// signal to switch the conversation language
    pub fn word_count(text: &str) -> usize {
        text.unicode_words().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_four_hits_is_hindi() {
        // mujhe, ghar, chahiye, kal
        let text = "mujhe 3bhk ghar chahiye kal";
        assert_eq!(LanguageDetector::default().count_hits(text), 4);
        assert_eq!(detect_language(text), Language::Hindi);
    }

    #[test]
    fn test_exactly_two_hits_is_hinglish() {
        let text = "kya price hai";
        assert_eq!(LanguageDetector::default().count_hits(text), 2);
        assert_eq!(detect_language(text), Language::Hinglish);
    }

    #[test]
    fn test_three_hits_is_hinglish() {
        assert_eq!(detect_language("kya price hai bhi"), Language::Hinglish);
    }

    #[test]
    fn test_zero_or_one_hit_is_english() {
        assert_eq!(detect_language("what is the price of a 2bhk flat"), Language::English);
        assert_eq!(detect_language("kya"), Language::English);
        assert_eq!(detect_language(""), Language::English);
    }

    #[test]
    fn test_hits_are_whole_words() {
        // "kite" and "hair" contain vocabulary substrings but are not hits
        assert_eq!(LanguageDetector::default().count_hits("kite hair khaki"), 0);
    }

    #[test]
    fn test_devanagari_words_count() {
        assert_eq!(detect_language("मुझे घर चाहिए जल्दी"), Language::Hindi);
        assert_eq!(detect_language("price क्या है"), Language::Hinglish);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(detect_language("KYA Price HAI"), Language::Hinglish);
    }
}
