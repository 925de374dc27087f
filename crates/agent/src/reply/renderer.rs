//! Template rotation and placeholder filling

use std::sync::Arc;

use lead_agent_config::TemplatesConfig;
use lead_agent_core::{ConversationState, Intent, ProjectContext};

/// Neutral stand-ins when project facts are missing
const FALLBACK_PROJECT: &str = "this project";
const FALLBACK_LOCATION: &str = "a well-connected location";
const FALLBACK_PRICE_RANGE: &str = "competitive prices";
const FALLBACK_UNIT_TYPES: &str = "multiple configurations";
const FALLBACK_STATUS: &str = "progressing as planned";
const FALLBACK_AMENITIES: &str = "modern amenities";

/// A rendered template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTemplate {
    pub reply: String,
    pub follow_up: Option<String>,
    /// Rotation index used for this render
    pub depth: u32,
}

impl RenderedTemplate {
    /// Reply with its follow-up question, if any
    pub fn full_text(&self) -> String {
        match &self.follow_up {
            Some(q) => format!("{} {}", self.reply, q),
            None => self.reply.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    templates: Arc<TemplatesConfig>,
}

impl TemplateRenderer {
    pub fn new(templates: Arc<TemplatesConfig>) -> Self {
        Self { templates }
    }

    pub fn has_template(&self, intent: Intent) -> bool {
        self.templates.has_template(intent)
    }

    /// Render the next template for `intent` in the state's language and
    /// advance its rotation counter. `None` when the intent has no pool.
    pub fn render(
        &self,
        state: &mut ConversationState,
        intent: Intent,
        project: Option<&ProjectContext>,
    ) -> Option<RenderedTemplate> {
        let pool = self.templates.pool(intent)?;
        let entries = pool.entries_for(state.reply_language());
        if entries.is_empty() {
            return None;
        }

        let depth = state.next_template_depth(intent);
        let entry = &entries[depth as usize % entries.len()];
        Some(RenderedTemplate {
            reply: fill_placeholders(&entry.reply, project),
            follow_up: entry
                .follow_up
                .as_deref()
                .map(|q| fill_placeholders(q, project)),
            depth,
        })
    }
}

/// Replace project placeholders with facts, or neutral wording when a fact
/// is unknown
pub fn fill_placeholders(template: &str, project: Option<&ProjectContext>) -> String {
    let or = |value: Option<String>, fallback: &str| {
        value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };

    let name = or(project.map(|p| p.name.clone()), FALLBACK_PROJECT);
    let location = or(project.map(|p| p.location.clone()), FALLBACK_LOCATION);
    let price_range = or(project.map(|p| p.price_range.clone()), FALLBACK_PRICE_RANGE);
    let unit_types = or(project.map(|p| p.unit_types.join(", ")), FALLBACK_UNIT_TYPES);
    let status = or(project.map(|p| p.status.clone()), FALLBACK_STATUS);
    let amenities = or(project.map(|p| p.amenities.join(", ")), FALLBACK_AMENITIES);

    template
        .replace("{project}", &name)
        .replace("{location}", &location)
        .replace("{price_range}", &price_range)
        .replace("{unit_types}", &unit_types)
        .replace("{status}", &status)
        .replace("{amenities}", &amenities)
}
