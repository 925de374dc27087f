//! Generative responder trait

use async_trait::async_trait;

use crate::{ChatEntry, Result};

/// Free-form reply generation.
///
/// Implementations may fail or time out; callers are expected to fall back
/// to fixed replies instead of surfacing the error to the user.
#[async_trait]
pub trait GenerativeResponder: Send + Sync {
    /// Generate a reply for `user_text` given the recent `context` window
    async fn generate(
        &self,
        system_prompt: &str,
        context: &[ChatEntry],
        user_text: &str,
    ) -> Result<String>;

    /// Name used in logs
    fn name(&self) -> &str {
        "responder"
    }
}
