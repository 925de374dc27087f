//! Project facts the agent is allowed to talk about

use serde::{Deserialize, Serialize};

/// Read-only facts about one real-estate project.
///
/// Replies may only assert what is listed here; anything else is deferred
/// to the advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProjectContext {
    /// Stable identifier used by conversation records
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub price_range: String,
    #[serde(default)]
    pub unit_types: Vec<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Extra names users may call the project by
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl ProjectContext {
    /// Fact block embedded in generative prompts
    pub fn facts_block(&self) -> String {
        let mut lines = vec![format!("Project: {}", self.name)];
        if !self.location.is_empty() {
            lines.push(format!("Location: {}", self.location));
        }
        if !self.price_range.is_empty() {
            lines.push(format!("Price range: {}", self.price_range));
        }
        if !self.unit_types.is_empty() {
            lines.push(format!("Configurations: {}", self.unit_types.join(", ")));
        }
        if !self.status.is_empty() {
            lines.push(format!("Status: {}", self.status));
        }
        if !self.amenities.is_empty() {
            lines.push(format!("Amenities: {}", self.amenities.join(", ")));
        }
        lines.join("\n")
    }

    /// Whether the lowercased text names this project
    pub fn is_mentioned_in(&self, lowered: &str) -> bool {
        std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .map(|name| name.trim().to_lowercase())
            .filter(|name| name.len() >= 3)
            .any(|name| lowered.contains(&name))
    }

    /// One-line pitch used when the funnel presents the project
    pub fn summary_line(&self) -> String {
        let mut parts = vec![self.name.clone()];
        if !self.location.is_empty() {
            parts.push(format!("in {}", self.location));
        }
        if !self.unit_types.is_empty() {
            parts.push(format!("offering {}", self.unit_types.join(" / ")));
        }
        if !self.price_range.is_empty() {
            parts.push(format!("priced {}", self.price_range));
        }
        parts.join(" ")
    }
}
