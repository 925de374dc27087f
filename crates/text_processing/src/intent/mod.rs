//! Intent Detection
//!
//! Classifies a user message into one [`Intent`] by walking a fixed,
//! priority-ordered list of keyword sets. The first set with a
//! word-boundary match wins; no match yields [`Intent::Unknown`].
//!
//! # Example
//!
//! ```
//! use lead_agent_text_processing::intent::IntentClassifier;
//! use lead_agent_core::Intent;
//!
//! let classifier = IntentClassifier::new();
//! assert_eq!(classifier.detect("hi, can I get the brochure?"), Intent::DocumentRequest);
//! assert_eq!(classifier.detect("ok"), Intent::Unknown);
//! ```

use lead_agent_core::Intent;
use once_cell::sync::Lazy;

use crate::PhraseSet;

/// Keyword sets in priority order. High-intent requests come first so a
/// greeting combined with a visit request still classifies as a visit.
const KEYWORDS: &[(Intent, &[&str])] = &[
    (
        Intent::CallbackRequest,
        &[
            "call me",
            "callback",
            "call back",
            "phone",
            "baat karni",
            "baat karna",
            "call karo",
            "contact me",
        ],
    ),
    (
        Intent::SiteVisit,
        &[
            "site visit",
            "visit",
            "dekhna",
            "dekhne",
            "location bhejo",
            "see the site",
            "see the property",
            "show me the property",
        ],
    ),
    (
        Intent::DocumentRequest,
        &["brochure", "floor plan", "images", "photos", "layout", "pdf"],
    ),
    (
        Intent::LegalTrust,
        &["rera", "legal", "approved", "approval", "registry", "title clear"],
    ),
    (
        Intent::Objection,
        &[
            "expensive",
            "costly",
            "mehnga",
            "mehenga",
            "price high",
            "too high",
            "discount",
        ],
    ),
    (
        Intent::PaymentPlan,
        &["emi", "loan", "down payment", "installment", "payment plan"],
    ),
    (
        Intent::PriceQuery,
        &[
            "price",
            "cost",
            "budget",
            "rate",
            "kitna",
            "kitne ka",
            "daam",
            "starting price",
            "total amount",
        ],
    ),
    (
        Intent::TimelineQuery,
        &["possession", "ready to move", "handover", "completion", "kab milega"],
    ),
    (
        Intent::InventoryQuery,
        &[
            "1bhk",
            "2bhk",
            "3bhk",
            "4bhk",
            "bhk",
            "plot",
            "size",
            "carpet area",
            "super built",
            "floor",
            "sq ft",
            "sqft",
        ],
    ),
    (
        Intent::LocationQuery,
        &["location", "area", "kidhar", "where", "kis area", "region", "address"],
    ),
    (
        Intent::AmenitiesQuery,
        &[
            "amenities",
            "facilities",
            "aas paas",
            "school",
            "hospital",
            "nearby",
            "gym",
            "pool",
            "clubhouse",
            "parking",
        ],
    ),
    (
        Intent::Vague,
        &["tell me more", "explain", "details", "worth it", "more info"],
    ),
    (
        Intent::Greeting,
        &["hi", "hello", "hey", "namaste", "good morning", "good evening"],
    ),
];

static DEFAULT_CLASSIFIER: Lazy<IntentClassifier> = Lazy::new(IntentClassifier::new);

/// Classify with the built-in keyword sets
pub fn detect_intent(text: &str) -> Intent {
    DEFAULT_CLASSIFIER.detect(text)
}

/// Priority-ordered keyword classifier
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<(Intent, PhraseSet)>,
}

impl IntentClassifier {
    /// Classifier over the built-in keyword sets
    pub fn new() -> Self {
        Self::with_rules(
            KEYWORDS
                .iter()
                .map(|(intent, words)| (*intent, words.iter().copied())),
        )
    }

    /// Classifier over custom keyword sets, evaluated in the given order
    pub fn with_rules<I, W, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = (Intent, W)>,
        W: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rules: rules
                .into_iter()
                .map(|(intent, words)| (intent, PhraseSet::new(words)))
                .collect(),
        }
    }

    pub fn detect(&self, text: &str) -> Intent {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|(_, set)| set.is_match(&lowered))
            .map(|(intent, _)| *intent)
            .unwrap_or(Intent::Unknown)
    }

    /// The phrase that decided the classification, for logging
    pub fn explain<'a>(&self, lowered: &'a str) -> Option<(Intent, &'a str)> {
        self.rules
            .iter()
            .find_map(|(intent, set)| set.find(lowered).map(|m| (*intent, m)))
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}
