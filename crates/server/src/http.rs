//! HTTP Endpoints
//!
//! WhatsApp webhook (verification handshake and inbound deliveries), a
//! direct message API for testing without WhatsApp, conversation lookup,
//! health and metrics.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{MatchedPath, Path, Query, Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use lead_agent_agent::TurnOutcome;
use lead_agent_core::{mask_phone, InboundMessage};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::metrics::{metrics_handler, record_request};
use crate::state::AppState;
use crate::webhook::WebhookPayload;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.timeout_seconds.max(1));

    Router::new()
        // WhatsApp Cloud API
        .route("/whatsapp/webhook", get(verify_webhook).post(receive_webhook))
        // Direct API
        .route("/api/messages", post(post_message))
        .route("/api/conversations/:phone", get(get_conversation))
        // Health check
        .route("/health", get(health_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(count_requests))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If no configured origin parses, falls back to localhost:3000
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    let allowed = if parsed.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to localhost:3000");
        vec![HeaderValue::from_static("http://localhost:3000")]
    } else {
        tracing::info!("CORS configured with {} origins", parsed.len());
        parsed
    };

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn count_requests(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let response = next.run(request).await;
    record_request(&route, response.status());
    response
}

#[derive(Debug, Deserialize)]
struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// Meta's subscription handshake: echo the challenge when the token matches
async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<String, ServerError> {
    let expected = &state.config.whatsapp.verify_token;
    let token_ok = !expected.is_empty() && params.verify_token.as_deref() == Some(expected.as_str());

    match (params.mode.as_deref(), params.challenge) {
        (Some("subscribe"), Some(challenge)) if token_ok => {
            tracing::info!("Webhook verified");
            Ok(challenge)
        }
        _ => {
            tracing::warn!(mode = ?params.mode, "Webhook verification rejected");
            Err(ServerError::Verification)
        }
    }
}

/// Inbound deliveries. Always acknowledged with 200 so Meta does not retry
/// payloads we cannot use; messages are processed after the response.
async fn receive_webhook(State(state): State<AppState>, body: Bytes) -> Json<serde_json::Value> {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed webhook payload");
            return Json(serde_json::json!({ "status": "ignored" }));
        }
    };

    let messages = payload.inbound_messages();
    let count = messages.len();
    if count > 0 {
        let engine = state.engine.clone();
        // Sequential, so a batch from one sender keeps its order
        tokio::spawn(async move {
            for message in messages {
                if let Err(e) = engine.handle(message).await {
                    tracing::warn!(error = %e, "Webhook message not processed");
                }
            }
        });
    }

    Json(serde_json::json!({ "status": "received", "messages": count }))
}

#[derive(Debug, Deserialize)]
struct PostMessageRequest {
    phone: String,
    text: String,
    #[serde(default)]
    message_id: Option<String>,
}

/// Run one turn synchronously and return its outcome
async fn post_message(
    State(state): State<AppState>,
    Json(request): Json<PostMessageRequest>,
) -> Result<Json<TurnOutcome>, ServerError> {
    if request.phone.trim().is_empty() {
        return Err(ServerError::InvalidRequest("phone is required".to_string()));
    }
    let message_id = request
        .message_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let outcome = state
        .engine
        .handle(InboundMessage::new(request.phone, request.text, message_id))
        .await?;
    Ok(Json(outcome))
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let snapshot = state.states().snapshot(&phone).await?;
    let Some(conversation) = snapshot else {
        return Err(ServerError::NotFound(format!("No conversation for {}", mask_phone(&phone))));
    };

    let rank = conversation.rank(state.engine.thresholds());
    Ok(Json(serde_json::json!({
        "rank": rank,
        "conversation": conversation,
    })))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "conversations": state.states().store().len(),
            "projects": state.catalog.projects.len(),
        })),
    )
}
