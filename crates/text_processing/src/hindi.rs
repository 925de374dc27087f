//! Hindi Language Utilities
//!
//! Shared helpers for romanized and Devanagari Hindi: the vocabulary used
//! for language detection, script checks and number words used when
//! reading budgets.

/// Romanized Hindi words common in property chats.
///
/// English words that Hinglish speakers also use ("flat", "loan", "visit")
/// are left out so plain English messages never count as Hindi.
pub const ROMANIZED_VOCABULARY: &[&str] = &[
    "kya", "kab", "kaise", "kahan", "kidhar", "kitna", "kitne", "kitni", "ghar", "zameen",
    "makaan", "kal", "aaj", "paisa", "paise", "dekho", "dekhna", "dekhne", "wali", "wala",
    "ke", "ki", "ka", "hai", "hain", "nahi", "nahin", "mujhe", "chahiye", "aap", "hum",
    "accha", "acha", "theek", "haan", "batao", "bata", "batana", "karna", "karo", "lena",
    "daam", "sasta", "mehnga", "jaldi", "abhi", "baad", "mein", "bhi", "aur", "toh",
];

/// Whether a word token is in the romanized vocabulary
pub fn is_romanized_hindi(word: &str) -> bool {
    ROMANIZED_VOCABULARY.contains(&word)
}

/// Whether a token is written in Devanagari script
pub fn is_devanagari(word: &str) -> bool {
    word.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c))
}

/// Replace Devanagari digits (०-९) with ASCII digits
pub fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{0966}'..='\u{096F}' => {
                char::from_digit(c as u32 - 0x0966, 10).unwrap_or(c)
            },
            other => other,
        })
        .collect()
}

/// Convert a Hindi number word (Devanagari or romanized) to its value
///
/// # Examples
/// ```
/// use lead_agent_text_processing::hindi::word_to_number;
/// assert_eq!(word_to_number("पचास"), Some(50.0));
/// assert_eq!(word_to_number("pachas"), Some(50.0));
/// assert_eq!(word_to_number("sau"), Some(100.0));
/// ```
pub fn word_to_number(word: &str) -> Option<f64> {
    match word {
        "एक" | "ek" => Some(1.0),
        "दो" | "do" => Some(2.0),
        "तीन" | "teen" => Some(3.0),
        "चार" | "char" => Some(4.0),
        "पांच" | "पाँच" | "paanch" | "panch" => Some(5.0),
        "दस" | "das" => Some(10.0),
        "बीस" | "bees" => Some(20.0),
        "पच्चीस" | "pachchees" => Some(25.0),
        "तीस" | "tees" => Some(30.0),
        "चालीस" | "chalees" => Some(40.0),
        "पचास" | "pachas" => Some(50.0),
        "साठ" | "saath" => Some(60.0),
        "सत्तर" | "sattar" => Some(70.0),
        "अस्सी" | "assi" => Some(80.0),
        "नब्बे" | "nabbe" => Some(90.0),
        "सौ" | "sau" => Some(100.0),
        _ => None,
    }
}
