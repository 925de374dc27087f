//! Outbound WhatsApp delivery
//!
//! - `WhatsAppSender`: Graph API text messages with a per-attempt timeout
//!   and a bounded retry budget
//! - `LogOnlySender`: logs replies instead of sending, for development

use std::time::Duration;

use async_trait::async_trait;
use lead_agent_config::WhatsAppConfig;
use lead_agent_core::{mask_phone, DeliveryReceipt, OutboundSender};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ServerError;

const RETRY_BACKOFF: Duration = Duration::from_millis(300);

#[derive(Error, Debug)]
enum SendError {
    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl SendError {
    fn is_retryable(&self) -> bool {
        match self {
            SendError::Http { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            SendError::Transport(_) => true,
        }
    }
}

#[derive(Serialize)]
struct TextMessage<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

#[derive(Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

#[derive(Deserialize, Default)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Deserialize)]
struct SentMessage {
    id: String,
}

/// WhatsApp Cloud API sender
pub struct WhatsAppSender {
    client: Client,
    url: String,
    access_token: String,
    max_attempts: u32,
}

impl WhatsAppSender {
    pub fn new(config: &WhatsAppConfig) -> Result<Self, ServerError> {
        if !config.has_credentials() {
            return Err(ServerError::Config(
                "whatsapp.access_token and whatsapp.phone_number_id are required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.send_timeout_ms))
            .build()
            .map_err(|e| ServerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.messages_url(),
            access_token: config.access_token.clone(),
            max_attempts: config.send_max_attempts.max(1),
        })
    }

    async fn post(&self, recipient: &str, text: &str) -> Result<DeliveryReceipt, SendError> {
        let payload = TextMessage {
            messaging_product: "whatsapp",
            to: recipient,
            kind: "text",
            text: TextBody { body: text },
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SendError::Http { status, body });
        }

        let parsed: SendResponse = response.json().await.unwrap_or_default();
        Ok(DeliveryReceipt {
            provider_message_id: parsed.messages.into_iter().next().map(|m| m.id),
        })
    }
}

#[async_trait]
impl OutboundSender for WhatsAppSender {
    async fn send(&self, recipient: &str, text: &str) -> lead_agent_core::Result<DeliveryReceipt> {
        let mut attempt = 1;
        loop {
            match self.post(recipient, text).await {
                Ok(receipt) => return Ok(receipt),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    tracing::warn!(
                        phone = %mask_phone(recipient),
                        attempt,
                        error = %e,
                        "WhatsApp send failed, retrying"
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(lead_agent_core::Error::Delivery(e.to_string()));
                }
            }
        }
    }
}

/// Logs replies instead of delivering them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlySender;

impl LogOnlySender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OutboundSender for LogOnlySender {
    async fn send(&self, recipient: &str, text: &str) -> lead_agent_core::Result<DeliveryReceipt> {
        tracing::info!(phone = %mask_phone(recipient), reply = %text, "Outbound reply (dry run)");
        Ok(DeliveryReceipt::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_requires_credentials() {
        let config = WhatsAppConfig {
            access_token: String::new(),
            phone_number_id: String::new(),
            ..Default::default()
        };
        assert!(matches!(WhatsAppSender::new(&config), Err(ServerError::Config(_))));
    }

    #[test]
    fn test_payload_shape() {
        let payload = TextMessage {
            messaging_product: "whatsapp",
            to: "919800000001",
            kind: "text",
            text: TextBody { body: "Hello" },
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"]["body"], "Hello");
        assert_eq!(json["messaging_product"], "whatsapp");
    }

    #[test]
    fn test_retryable_statuses() {
        let err = |status| SendError::Http {
            status,
            body: String::new(),
        };
        assert!(err(StatusCode::BAD_GATEWAY).is_retryable());
        assert!(err(StatusCode::TOO_MANY_REQUESTS).is_retryable());
        assert!(!err(StatusCode::UNAUTHORIZED).is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_reports_delivery_error() {
        let config = WhatsAppConfig {
            access_token: "token".to_string(),
            phone_number_id: "123".to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
            send_timeout_ms: 500,
            send_max_attempts: 1,
            ..Default::default()
        };
        let sender = WhatsAppSender::new(&config).unwrap();
        let err = sender.send("919800000001", "hi").await.unwrap_err();
        assert!(matches!(err, lead_agent_core::Error::Delivery(_)));
    }

    #[tokio::test]
    async fn test_log_only_sender() {
        let receipt = LogOnlySender::new().send("919800000001", "hi").await.unwrap();
        assert_eq!(receipt, DeliveryReceipt::default());
    }
}
