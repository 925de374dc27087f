//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use lead_agent_agent::ConversationEngine;
use lead_agent_config::{LlmSettings, ProjectCatalog, Settings};
use lead_agent_core::{GenerativeResponder, HandoffSink, OutboundSender};
use lead_agent_llm::{GenerationParams, OpenAIBackend, OpenAIConfig, ResilientResponder, RetryPolicy};
use lead_agent_persistence::{InMemoryStore, KeyedStateStore, LogHandoffSink};

use crate::whatsapp::LogOnlySender;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub catalog: Arc<ProjectCatalog>,
    pub engine: Arc<ConversationEngine>,
}

impl AppState {
    /// In-memory store, dry-run sender and log sink; no generative backend
    pub fn new(config: Settings, catalog: ProjectCatalog) -> Self {
        Self::with_components(
            config,
            catalog,
            Arc::new(LogOnlySender::new()),
            Arc::new(LogHandoffSink::new()),
            None,
        )
    }

    /// Wire the engine from explicit outbound components
    pub fn with_components(
        config: Settings,
        catalog: ProjectCatalog,
        sender: Arc<dyn OutboundSender>,
        sink: Arc<dyn HandoffSink>,
        responders: Option<(Arc<dyn GenerativeResponder>, Arc<dyn GenerativeResponder>)>,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let states = Arc::new(KeyedStateStore::new(Arc::new(InMemoryStore::new())));
        let mut engine =
            ConversationEngine::new(&config, Arc::clone(&catalog), states, sender, sink);
        if let Some((responder, support)) = responders {
            engine = engine.with_responders(responder, Some(support));
        }

        Self {
            config: Arc::new(config),
            catalog,
            engine: Arc::new(engine),
        }
    }

    pub fn states(&self) -> &Arc<KeyedStateStore> {
        self.engine.states()
    }
}

/// Build the normal and support-only responders over one shared backend.
///
/// Returns `None` when generation is disabled or the backend cannot be
/// configured; the engine then answers from templates and fallbacks.
pub fn build_responders(
    settings: &LlmSettings,
) -> Option<(Arc<dyn GenerativeResponder>, Arc<dyn GenerativeResponder>)> {
    if !settings.enabled {
        tracing::info!("Generative replies disabled");
        return None;
    }

    let backend = match OpenAIBackend::new(OpenAIConfig::from_settings(settings)) {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            tracing::warn!(error = %e, "Generative backend unavailable, using fixed replies");
            return None;
        }
    };

    let policy = RetryPolicy::from_settings(settings);
    let responder = ResilientResponder::new(
        Arc::clone(&backend),
        GenerationParams {
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        },
        policy,
    );
    let support = ResilientResponder::new(
        backend,
        GenerationParams {
            temperature: settings.support_temperature,
            max_tokens: settings.support_max_tokens,
        },
        policy,
    )
    .with_name(format!("{}-support", settings.model));

    tracing::info!(model = %settings.model, endpoint = %settings.endpoint, "Generative replies enabled");
    Some((Arc::new(responder), Arc::new(support)))
}
