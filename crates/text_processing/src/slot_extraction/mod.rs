//! Slot Extraction
//!
//! Pulls qualification answers out of free text: budget amounts with
//! lakh/crore multipliers (ASCII, Devanagari digits and Hindi number
//! words), purchase purpose, timeline and a preferred visit time.

use lead_agent_core::Slots;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::hindi;

/// "80 lakh", "1.2 cr", "75L", "₹ 90 lac", "80 लाख"
static AMOUNT_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d+(?:\.\d+)?)\s*(crores?|cr|lakhs?|lacs?|l|k|करोड़|करोड|लाख|हज़ार|हजार)(?:\b|\s|$)",
    )
    .expect("static amount pattern")
});

/// "₹8500000", "rs 85,00,000", "8500000"
static PLAIN_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:₹|rs\.?|inr)?\s*(\d{1,3}(?:,\d{2,3})+|\d{5,})").expect("static plain amount pattern")
});

static TIMELINE_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})\s*(months?|mahine|mahina|years?|yrs?|saal)\b")
        .expect("static timeline pattern")
});

static VISIT_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(today|tomorrow|aaj|kal|parso|weekend|weekday|monday|tuesday|wednesday|thursday|friday|saturday|sunday|morning|afternoon|evening|subah|shaam|\d{1,2}\s*(?:am|pm)|\d{1,2}:\d{2})\b",
    )
    .expect("static visit time pattern")
});

/// Stateless slot extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotExtractor;

impl SlotExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Budget amount, normalized to "<n> lakh" / "<n> crore" / "₹<n>"
    pub fn extract_budget(&self, text: &str) -> Option<String> {
        let lowered = hindi::normalize_digits(&text.to_lowercase());

        if let Some(caps) = AMOUNT_WITH_UNIT.captures(&lowered) {
            let number = caps.get(1)?.as_str();
            let unit = match caps.get(2)?.as_str() {
                "cr" | "crore" | "crores" | "करोड़" | "करोड" => "crore",
                "k" | "हज़ार" | "हजार" => "thousand",
                _ => "lakh",
            };
            return Some(format!("{} {}", number, unit));
        }

        if let Some(value) = Self::number_word_amount(&lowered) {
            return Some(value);
        }

        PLAIN_AMOUNT
            .captures(&lowered)
            .and_then(|caps| caps.get(1))
            .map(|m| format!("₹{}", m.as_str().replace(',', "")))
    }

    /// Whether the text reads as a budget answer
    pub fn is_amount_like(&self, text: &str) -> bool {
        self.extract_budget(text).is_some()
    }

    /// "assi lakh", "पचास लाख", "do crore"
    fn number_word_amount(lowered: &str) -> Option<String> {
        let words: Vec<&str> = lowered.unicode_words().collect();
        words.windows(2).find_map(|pair| {
            let value = hindi::word_to_number(pair[0])?;
            let unit = match pair[1] {
                "lakh" | "lac" | "लाख" => "lakh",
                "crore" | "cr" | "करोड़" | "करोड" => "crore",
                _ => return None,
            };
            Some(format!("{} {}", value, unit))
        })
    }

    /// Purchase purpose: investment, self use or rental
    pub fn extract_purpose(&self, text: &str) -> Option<String> {
        let lowered = text.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lowered.contains(w));

        if has(&["invest", "returns", "appreciation"]) {
            Some("investment".to_string())
        } else if has(&["rental income", "rent out", "for rent"]) {
            Some("rental".to_string())
        } else if has(&[
            "self use", "self-use", "own use", "to live", "family", "rehne", "end use", "end-use",
        ]) {
            Some("self use".to_string())
        } else {
            None
        }
    }

    /// Purchase timeline: immediate, ready to move, or a span like "6 months"
    pub fn extract_timeline(&self, text: &str) -> Option<String> {
        let lowered = hindi::normalize_digits(&text.to_lowercase());

        if let Some(caps) = TIMELINE_SPAN.captures(&lowered) {
            let n = caps.get(1)?.as_str();
            let unit = if caps.get(2)?.as_str().starts_with('m') {
                "months"
            } else {
                "years"
            };
            return Some(format!("within {} {}", n, unit));
        }

        if lowered.contains("ready to move") {
            Some("ready to move".to_string())
        } else if ["immediate", "asap", "urgent", "jaldi"]
            .iter()
            .any(|w| lowered.contains(w))
        {
            Some("immediate".to_string())
        } else {
            None
        }
    }

    /// Preferred visit time, kept as the user wrote it when it names a day
    /// or time of day
    pub fn extract_visit_time(&self, text: &str) -> Option<String> {
        let lowered = text.to_lowercase();
        VISIT_TIME
            .is_match(&lowered)
            .then(|| text.trim().to_string())
    }

    /// Fill empty purpose/timeline slots from any message. Existing values
    /// are never overwritten.
    pub fn fill_opportunistic(&self, slots: &mut Slots, text: &str) -> bool {
        let mut changed = false;
        if slots.purpose.is_none() {
            if let Some(purpose) = self.extract_purpose(text) {
                slots.purpose = Some(purpose);
                changed = true;
            }
        }
        if slots.timeline.is_none() {
            if let Some(timeline) = self.extract_timeline(text) {
                slots.timeline = Some(timeline);
                changed = true;
            }
        }
        changed
    }
}
