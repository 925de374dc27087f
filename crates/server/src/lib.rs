//! Lead Agent Server
//!
//! WhatsApp Cloud API webhook plus a small HTTP API around the
//! conversation engine.

pub mod http;
pub mod metrics;
pub mod state;
pub mod sweeper;
pub mod webhook;
pub mod whatsapp;

pub use http::create_router;
pub use metrics::{init_metrics, metrics_handler, record_request};
pub use state::{build_responders, AppState};
pub use sweeper::start_idle_sweeper;
pub use webhook::WebhookPayload;
pub use whatsapp::{LogOnlySender, WhatsAppSender};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lead_agent_agent::AgentError;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Verification failed")]
    Verification,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Verification => StatusCode::FORBIDDEN,
            ServerError::Config(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        err.status_code()
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::InvalidMessage(msg) => ServerError::InvalidRequest(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<lead_agent_core::Error> for ServerError {
    fn from(err: lead_agent_core::Error) -> Self {
        match err {
            lead_agent_core::Error::Config(msg) => ServerError::Config(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<lead_agent_config::ConfigError> for ServerError {
    fn from(err: lead_agent_config::ConfigError) -> Self {
        ServerError::Config(err.to_string())
    }
}
