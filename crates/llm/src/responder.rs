//! Bounded-retry adapter from an [`LlmBackend`] to the core responder trait

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lead_agent_config::LlmSettings;
use lead_agent_core::{ChatEntry, GenerativeResponder};

use crate::backend::{GenerationParams, LlmBackend};
use crate::prompt::build_messages;
use crate::LlmError;

/// Hard ceiling on attempts per reply
const MAX_ATTEMPTS_CEILING: u32 = 2;

/// Timeout and retry budget for one reply
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Per-attempt timeout
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(12_000),
            max_attempts: MAX_ATTEMPTS_CEILING,
            backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub fn new(timeout: Duration, max_attempts: u32, backoff: Duration) -> Self {
        Self {
            timeout,
            max_attempts: max_attempts.clamp(1, MAX_ATTEMPTS_CEILING),
            backoff,
        }
    }

    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self::new(
            Duration::from_millis(settings.timeout_ms),
            settings.max_attempts,
            Duration::from_millis(settings.retry_backoff_ms),
        )
    }
}

/// Wraps a backend with a per-attempt timeout and bounded retries.
///
/// Empty or whitespace-only completions count as failures.
pub struct ResilientResponder<B: LlmBackend + ?Sized> {
    backend: Arc<B>,
    params: GenerationParams,
    policy: RetryPolicy,
    name: String,
}

impl<B: LlmBackend + ?Sized> ResilientResponder<B> {
    pub fn new(backend: Arc<B>, params: GenerationParams, policy: RetryPolicy) -> Self {
        let name = backend.model_name().to_string();
        Self {
            backend,
            params,
            policy,
            name,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    async fn attempt(
        &self,
        messages: &[crate::prompt::Message],
    ) -> Result<String, LlmError> {
        let timeout_ms = self.policy.timeout.as_millis() as u64;
        let result = tokio::time::timeout(
            self.policy.timeout,
            self.backend.generate(messages, self.params),
        )
        .await
        .map_err(|_| LlmError::Timeout(timeout_ms))??;

        let text = result.text.trim();
        if text.is_empty() {
            return Err(LlmError::InvalidResponse("empty completion".to_string()));
        }
        Ok(text.to_string())
    }

    /// Run the retry loop and return the backend error type
    pub async fn complete(
        &self,
        system_prompt: &str,
        context: &[ChatEntry],
        user_text: &str,
    ) -> Result<String, LlmError> {
        let messages = build_messages(system_prompt, context, user_text);
        let mut last_error = None;

        for attempt in 1..=self.policy.max_attempts {
            if attempt > 1 {
                tracing::warn!(
                    responder = %self.name,
                    "generation failed, retrying in {:?} (attempt {}/{})",
                    self.policy.backoff,
                    attempt,
                    self.policy.max_attempts
                );
                tokio::time::sleep(self.policy.backoff).await;
            }

            match self.attempt(&messages).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() || matches!(e, LlmError::InvalidResponse(_)) => {
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Network("no attempts made".to_string())))
    }
}

#[async_trait]
impl<B: LlmBackend + ?Sized + 'static> GenerativeResponder for ResilientResponder<B> {
    async fn generate(
        &self,
        system_prompt: &str,
        context: &[ChatEntry],
        user_text: &str,
    ) -> lead_agent_core::Result<String> {
        self.complete(system_prompt, context, user_text)
            .await
            .map_err(Into::into)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
