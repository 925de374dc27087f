//! Intent labels produced by the classifier

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the user is asking for in a single message.
///
/// Variant order here is the classifier's priority order: when a message
/// matches several keyword sets the earliest variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CallbackRequest,
    SiteVisit,
    DocumentRequest,
    LegalTrust,
    Objection,
    PaymentPlan,
    PriceQuery,
    TimelineQuery,
    InventoryQuery,
    LocationQuery,
    AmenitiesQuery,
    Vague,
    Greeting,
    /// No keyword set matched
    Unknown,
}

impl Intent {
    /// Every intent in priority order
    pub const ALL: [Intent; 14] = [
        Intent::CallbackRequest,
        Intent::SiteVisit,
        Intent::DocumentRequest,
        Intent::LegalTrust,
        Intent::Objection,
        Intent::PaymentPlan,
        Intent::PriceQuery,
        Intent::TimelineQuery,
        Intent::InventoryQuery,
        Intent::LocationQuery,
        Intent::AmenitiesQuery,
        Intent::Vague,
        Intent::Greeting,
        Intent::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CallbackRequest => "callback_request",
            Intent::SiteVisit => "site_visit",
            Intent::DocumentRequest => "document_request",
            Intent::LegalTrust => "legal_trust",
            Intent::Objection => "objection",
            Intent::PaymentPlan => "payment_plan",
            Intent::PriceQuery => "price_query",
            Intent::TimelineQuery => "timeline_query",
            Intent::LocationQuery => "location_query",
            Intent::AmenitiesQuery => "amenities_query",
            Intent::InventoryQuery => "inventory_query",
            Intent::Vague => "vague",
            Intent::Greeting => "greeting",
            Intent::Unknown => "unknown",
        }
    }

    /// Intents that request a human immediately
    pub fn is_high_intent(&self) -> bool {
        matches!(self, Intent::SiteVisit | Intent::CallbackRequest)
    }

    /// Project questions the funnel answers before re-asking its own question
    pub fn is_project_question(&self) -> bool {
        matches!(
            self,
            Intent::PriceQuery
                | Intent::LocationQuery
                | Intent::AmenitiesQuery
                | Intent::InventoryQuery
                | Intent::PaymentPlan
                | Intent::LegalTrust
                | Intent::DocumentRequest
                | Intent::TimelineQuery
                | Intent::Objection
        )
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Intent::ALL
            .iter()
            .copied()
            .find(|intent| intent.as_str() == wanted)
            .ok_or_else(|| format!("unknown intent: {s}"))
    }
}
