//! Lead qualification engine
//!
//! Features:
//! - Forward-only qualification funnel (language, budget, location, visit)
//! - Additive lead scoring with derived cold/warm/hot rank
//! - One-time handoff to a human advisor
//! - Template rotation and guarded generative replies with fixed fallbacks
//! - Per-phone leased turns with duplicate-delivery suppression

pub mod engine;
pub mod error;
pub mod funnel;
pub mod handoff;
pub mod reply;
pub mod scoring;

pub use engine::{ConversationEngine, EngineConfig, TurnOutcome};
pub use error::AgentError;
pub use funnel::{FunnelOutcome, FunnelStateMachine, ReplyDirective};
pub use handoff::HandoffGate;
pub use reply::{
    fill_placeholders, strip_questions, FixedReply, RenderedTemplate, ReplySelector, ReplySource,
    SelectedReply, TemplateRenderer,
};
pub use scoring::{LeadScorer, ScoreUpdate};
