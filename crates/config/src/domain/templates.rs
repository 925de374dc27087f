//! Reply template pools
//!
//! Each intent maps to a pool of replies that the renderer rotates through.
//! Replies may contain project placeholders (`{project}`, `{location}`,
//! `{price_range}`, `{unit_types}`, `{status}`, `{amenities}`).

use lead_agent_core::{Intent, Language};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub reply: String,
    /// Question appended after the reply unless questions are stopped
    #[serde(default)]
    pub follow_up: Option<String>,
}

impl TemplateEntry {
    pub fn new(reply: &str, follow_up: Option<&str>) -> Self {
        Self {
            reply: reply.to_string(),
            follow_up: follow_up.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TemplatePool {
    /// English entries, also the fallback for other languages
    pub entries: Vec<TemplateEntry>,
    #[serde(default)]
    pub localized: HashMap<Language, Vec<TemplateEntry>>,
}

impl TemplatePool {
    /// Entries for a language, English when no localized pool exists
    pub fn entries_for(&self, language: Language) -> &[TemplateEntry] {
        match self.localized.get(&language) {
            Some(entries) if !entries.is_empty() => entries,
            _ => &self.entries,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    #[serde(default = "default_pools")]
    pub pools: HashMap<Intent, TemplatePool>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            pools: default_pools(),
        }
    }
}

impl TemplatesConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = super::load_yaml(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn pool(&self, intent: Intent) -> Option<&TemplatePool> {
        self.pools.get(&intent).filter(|pool| !pool.entries.is_empty())
    }

    pub fn has_template(&self, intent: Intent) -> bool {
        self.pool(intent).is_some()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (intent, pool) in &self.pools {
            if pool.entries.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("templates.pools.{}", intent),
                    message: "Pool must contain at least one entry".to_string(),
                });
            }
            if let Some(entry) = pool
                .entries
                .iter()
                .chain(pool.localized.values().flatten())
                .find(|e| e.reply.trim().is_empty())
            {
                return Err(ConfigError::InvalidValue {
                    field: format!("templates.pools.{}", intent),
                    message: format!("Empty reply text ({:?})", entry),
                });
            }
        }
        Ok(())
    }
}

fn pool(entries: &[(&str, Option<&str>)]) -> TemplatePool {
    TemplatePool {
        entries: entries
            .iter()
            .map(|(reply, follow_up)| TemplateEntry::new(reply, *follow_up))
            .collect(),
        localized: HashMap::new(),
    }
}

fn with_hinglish(mut base: TemplatePool, entries: &[(&str, Option<&str>)]) -> TemplatePool {
    base.localized.insert(
        Language::Hinglish,
        entries
            .iter()
            .map(|(reply, follow_up)| TemplateEntry::new(reply, *follow_up))
            .collect(),
    );
    base
}

fn default_pools() -> HashMap<Intent, TemplatePool> {
    let mut pools = HashMap::new();

    pools.insert(
        Intent::PriceQuery,
        with_hinglish(
            pool(&[
                (
                    "{project} is priced at {price_range}. Pricing depends on unit and floor.",
                    Some("Is this close to the budget you had in mind?"),
                ),
                (
                    "Prices at {project} are {price_range}, with multiple options available.",
                    Some("Are you looking for self-use or investment?"),
                ),
                (
                    "Current pricing is {price_range}. Exact quotes vary slightly by view and floor.",
                    Some("Would EMI planning help you decide?"),
                ),
            ]),
            &[
                (
                    "{project} ka price {price_range} hai. Unit aur floor ke hisaab se thoda vary karta hai.",
                    Some("Aapka budget range kya socha hai?"),
                ),
                (
                    "Pricing {price_range} ke beech hai, kaafi options available hain.",
                    Some("Self-use ke liye dekh rahe ho ya investment?"),
                ),
            ],
        ),
    );

    pools.insert(
        Intent::LocationQuery,
        with_hinglish(
            pool(&[
                (
                    "{project} is located in {location}, a well-connected area with daily conveniences nearby.",
                    Some("Are you looking for something close to your workplace?"),
                ),
                (
                    "The project is in {location}, close to schools, hospitals and markets.",
                    Some("Would you like landmarks or a map pin?"),
                ),
            ]),
            &[
                (
                    "{project} {location} mein hai, connectivity kaafi achhi hai.",
                    Some("Office location bata sakte ho?"),
                ),
                (
                    "Location {location} hai, schools aur hospitals paas mein hain.",
                    Some("Aap kis side ka area prefer karte ho?"),
                ),
            ],
        ),
    );

    pools.insert(
        Intent::AmenitiesQuery,
        pool(&[
            (
                "{project} offers {amenities}.",
                Some("Will this be for family living or investment?"),
            ),
            (
                "Residents get {amenities}, along with a peaceful environment.",
                Some("Which amenity matters most to you?"),
            ),
        ]),
    );

    pools.insert(
        Intent::InventoryQuery,
        pool(&[
            (
                "{project} has {unit_types} options with multiple layouts.",
                Some("Which configuration are you considering?"),
            ),
            (
                "Available configurations are {unit_types}. Inventory on preferred floors is limited.",
                Some("Any minimum size you have in mind?"),
            ),
        ]),
    );

    pools.insert(
        Intent::PaymentPlan,
        pool(&[
            (
                "Home loan options are available with leading banks, and the advisor can share the payment schedule.",
                Some("Are you planning to take a loan?"),
            ),
            (
                "Payment plans are linked to construction milestones. Our advisor will confirm the exact split on call.",
                Some("Would a lower down payment help you?"),
            ),
        ]),
    );

    pools.insert(
        Intent::LegalTrust,
        pool(&[(
            "{project} is {status}. Our advisor will share the approval and registration documents.",
            Some("Shall I ask them to send the documents?"),
        )]),
    );

    pools.insert(
        Intent::DocumentRequest,
        pool(&[
            (
                "Sure, I will ask our advisor to share the brochure and floor plans for {project}.",
                None,
            ),
            (
                "The brochure and layout for {project} will be shared by our advisor shortly.",
                None,
            ),
        ]),
    );

    pools.insert(
        Intent::TimelineQuery,
        pool(&[(
            "{project} is currently {status}. Our advisor will confirm the exact possession date on call.",
            Some("When are you planning to move in?"),
        )]),
    );

    pools.insert(
        Intent::Objection,
        pool(&[
            (
                "I understand. {project} has options across {price_range}, so there may be something that fits better.",
                Some("Which budget would feel comfortable?"),
            ),
            (
                "That is a fair concern. Many buyers compare a few projects before deciding.",
                Some("What would make this a better fit for you?"),
            ),
        ]),
    );

    pools.insert(
        Intent::SiteVisit,
        pool(&[
            ("Sure, a site visit can be arranged at your convenience.", None),
            ("Perfect, I will arrange a visit with our site advisor.", None),
        ]),
    );

    pools.insert(
        Intent::CallbackRequest,
        pool(&[("No problem, I will arrange a callback for you.", None)]),
    );

    pools.insert(
        Intent::Greeting,
        pool(&[
            ("Hello! Happy to help you with {project}.", Some("What would you like to know?")),
            ("Hi again! I am here for any questions about {project}.", None),
        ]),
    );

    pools
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TemplatesConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.has_template(Intent::PriceQuery));
        assert!(!config.has_template(Intent::Vague));
        assert!(!config.has_template(Intent::Unknown));
    }

    #[test]
    fn test_localized_fallback_to_english() {
        let config = TemplatesConfig::default();
        let price = config.pool(Intent::PriceQuery).unwrap();
        assert_eq!(price.entries_for(Language::Hinglish).len(), 2);
        assert_eq!(price.entries_for(Language::Hindi).len(), 3);

        let amenities = config.pool(Intent::AmenitiesQuery).unwrap();
        assert_eq!(
            amenities.entries_for(Language::Hinglish),
            amenities.entries.as_slice()
        );
    }

    #[test]
    fn test_empty_pool_rejected() {
        let mut config = TemplatesConfig::default();
        config.pools.insert(Intent::Vague, TemplatePool::default());
        assert!(config.validate().is_err());
        assert!(!config.has_template(Intent::Vague));
    }
}
