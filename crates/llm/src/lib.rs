//! Generative reply integration
//!
//! Features:
//! - OpenAI-compatible chat backend
//! - Persona prompt builder grounded on project facts
//! - Resilient responder: per-attempt timeout, at most two attempts,
//!   short backoff, empty output treated as failure

pub mod backend;
pub mod prompt;
pub mod responder;

pub use backend::{
    FinishReason, GenerationParams, GenerationResult, LlmBackend, OpenAIBackend, OpenAIConfig,
};
pub use prompt::{build_messages, Message, PromptBuilder, PromptMode, Role};
pub use responder::{ResilientResponder, RetryPolicy};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Network failures, server errors and timeouts may succeed on retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Network(_) | LlmError::Timeout(_))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for lead_agent_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout(ms) => lead_agent_core::Error::Timeout(ms),
            other => lead_agent_core::Error::Generation(other.to_string()),
        }
    }
}
