//! Text processing for the lead agent
//!
//! This crate provides the stateless classifiers the conversation engine
//! runs on every inbound message:
//! - **Intent Detection**: priority-ordered keyword sets with word-boundary matching
//! - **Language Detection**: Hindi/Hinglish vocabulary hit counting
//! - **Slot Extraction**: budget, purpose, timeline and visit time
//! - **Guardrails**: personal/internal and off-domain queries
//!
//! # Example
//!
//! ```
//! use lead_agent_text_processing::{detect_intent, detect_language};
//! use lead_agent_core::{Intent, Language};
//!
//! assert_eq!(detect_intent("I want to visit the site"), Intent::SiteVisit);
//! assert_eq!(detect_language("kya price hai"), Language::Hinglish);
//! ```

pub mod guardrails;
pub mod hindi;
pub mod intent;
pub mod language;
pub mod phrases;
pub mod slot_extraction;

pub use guardrails::{GuardrailVerdict, Guardrails};
pub use intent::{detect_intent, IntentClassifier};
pub use language::{detect_language, LanguageDetector};
pub use phrases::PhraseSet;
pub use slot_extraction::SlotExtractor;
