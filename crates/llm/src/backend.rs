//! LLM Backend implementations
//!
//! One OpenAI-compatible chat backend. Retries and timeouts are not handled
//! here; the responder wraps every call in its own bounded policy.

use std::time::Duration;

use async_trait::async_trait;
use lead_agent_config::LlmSettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::prompt::Message;
use crate::LlmError;

/// Sampling parameters for one call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.55,
            max_tokens: 140,
        }
    }
}

/// LLM generation result
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    /// Completion tokens reported by the provider
    pub tokens: usize,
    pub total_time_ms: u64,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
}

/// LLM Backend trait
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn generate(
        &self,
        messages: &[Message],
        params: GenerationParams,
    ) -> Result<GenerationResult, LlmError>;

    fn model_name(&self) -> &str;
}

/// Configuration for OpenAI-compatible backends
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API endpoint (OpenAI: https://api.openai.com/v1, or a compatible server)
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// Transport-level timeout; the responder applies a tighter one per attempt
    pub timeout: Duration,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl OpenAIConfig {
    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone().unwrap_or_default(),
            model: settings.model.clone(),
            timeout: Duration::from_millis(settings.timeout_ms.saturating_mul(2)),
        }
    }
}

/// OpenAI-compatible backend
///
/// Works with OpenAI, Azure-style proxies exposing `/chat/completions`,
/// vLLM and local servers with OpenAI-compatible APIs.
pub struct OpenAIBackend {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() && !is_local(&config.endpoint) {
            return Err(LlmError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }

    fn build_request(&self, messages: &[Message], params: GenerationParams) -> OpenAIChatRequest {
        OpenAIChatRequest {
            model: self.config.model.clone(),
            messages: messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: Some(params.max_tokens),
            temperature: Some(params.temperature),
            stream: Some(false),
        }
    }
}

fn is_local(endpoint: &str) -> bool {
    endpoint.starts_with("http://localhost") || endpoint.starts_with("http://127.0.0.1")
}

#[async_trait]
impl LlmBackend for OpenAIBackend {
    async fn generate(
        &self,
        messages: &[Message],
        params: GenerationParams,
    ) -> Result<GenerationResult, LlmError> {
        let start = std::time::Instant::now();
        let request = self.build_request(messages, params);

        let mut builder = self.client.post(self.chat_url()).json(&request);
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            // 5xx and 429 are retryable, other 4xx are not
            if status.is_server_error() || status.as_u16() == 429 {
                return Err(LlmError::Network(format!("HTTP {}: {}", status, error_text)));
            }
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let response: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        Ok(GenerationResult {
            text: choice.message.content.clone().unwrap_or_default(),
            tokens: response.usage.map(|u| u.completion_tokens).unwrap_or(0),
            total_time_ms: start.elapsed().as_millis() as u64,
            finish_reason: match choice.finish_reason.as_deref() {
                Some("length") => FinishReason::Length,
                _ => FinishReason::Stop,
            },
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    completion_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Role;

    fn local_backend() -> OpenAIBackend {
        OpenAIBackend::new(OpenAIConfig {
            endpoint: "http://localhost:8000/v1/".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_remote_endpoint_requires_key() {
        let result = OpenAIBackend::new(OpenAIConfig::default());
        assert!(matches!(result, Err(LlmError::Configuration(_))));
    }

    #[test]
    fn test_chat_url_trims_slash() {
        assert_eq!(
            local_backend().chat_url(),
            "http://localhost:8000/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_serialization() {
        let backend = local_backend();
        let messages = vec![
            Message::new(Role::System, "be brief"),
            Message::new(Role::User, "price?"),
        ];
        let request = backend.build_request(
            &messages,
            GenerationParams {
                temperature: 0.4,
                max_tokens: 100,
            },
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "price?");
        assert_eq!(json["max_tokens"], 100);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_response_parsing_tolerates_null_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null},"finish_reason":"stop"}]}"#;
        let parsed: OpenAIChatResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
        assert!(parsed.usage.is_none());
    }

    #[test]
    fn test_config_from_settings() {
        let settings = LlmSettings {
            api_key: Some("sk-test".to_string()),
            timeout_ms: 12_000,
            ..LlmSettings::default()
        };
        let config = OpenAIConfig::from_settings(&settings);
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.timeout, Duration::from_secs(24));
    }
}
