//! Prometheus metrics
//!
//! The engine records through the `metrics` facade; this module installs
//! the exporter once and renders it at `/metrics`.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<Option<PrometheusHandle>> = OnceCell::new();

const TURN_BUCKETS: &[f64] = &[0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 12.0, 30.0];

/// Install the Prometheus recorder. Safe to call more than once; only the
/// first call installs.
pub fn init_metrics() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_init(|| {
            let builder = match PrometheusBuilder::new().set_buckets_for_metric(
                Matcher::Full("lead_agent_turn_duration_seconds".to_string()),
                TURN_BUCKETS,
            ) {
                Ok(builder) => builder,
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid histogram buckets, using defaults");
                    PrometheusBuilder::new()
                }
            };
            match builder.install_recorder() {
                Ok(handle) => {
                    describe();
                    Some(handle)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to install metrics recorder");
                    None
                }
            }
        })
        .clone()
}

fn describe() {
    metrics::describe_counter!("lead_agent_messages_total", "Inbound messages by outcome");
    metrics::describe_counter!("lead_agent_handoffs_total", "Conversations handed off, by reason");
    metrics::describe_counter!(
        "lead_agent_generation_fallbacks_total",
        "Generative replies replaced by a fixed fallback"
    );
    metrics::describe_counter!("lead_agent_reply_fallbacks_total", "Turns answered with a fallback");
    metrics::describe_counter!(
        "lead_agent_duplicate_deliveries_total",
        "Inbound messages ignored as duplicates"
    );
    metrics::describe_counter!("lead_agent_delivery_failures_total", "Outbound sends that failed");
    metrics::describe_histogram!(
        "lead_agent_turn_duration_seconds",
        metrics::Unit::Seconds,
        "Time to process one inbound message"
    );
    metrics::describe_counter!("lead_agent_http_requests_total", "HTTP requests by route and status");
}

/// Count one HTTP request
pub fn record_request(route: &str, status: StatusCode) {
    metrics::counter!(
        "lead_agent_http_requests_total",
        "route" => route.to_string(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
}

pub async fn metrics_handler() -> impl IntoResponse {
    match HANDLE.get().and_then(|h| h.as_ref()) {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics exporter not installed".to_string(),
        ),
    }
}
