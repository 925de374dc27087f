//! Lead Agent Server Entry Point

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use lead_agent_config::{load_settings, HandoffSinkKind, ProjectCatalog, Settings};
use lead_agent_core::{HandoffSink, OutboundSender};
use lead_agent_persistence::{JsonlHandoffSink, LogHandoffSink};
use lead_agent_server::{
    build_responders, create_router, init_metrics, start_idle_sweeper, AppState, LogOnlySender,
    WhatsAppSender,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("LEAD_AGENT_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized
            eprintln!(
                "Loaded configuration from files (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&config);

    tracing::info!("Starting Lead Agent Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    if let Err(e) = config.validate() {
        if config.environment.is_strict() {
            return Err(e).context("invalid configuration");
        }
        tracing::warn!(error = %e, "Configuration problems tolerated outside production");
    }

    if config.observability.metrics_enabled {
        init_metrics();
        tracing::info!("Initialized Prometheus metrics at /metrics");
    }

    let catalog = match config.load_projects() {
        Ok(catalog) => catalog,
        Err(e) if !config.environment.is_strict() => {
            tracing::warn!(error = %e, path = %config.project_path, "No project catalog, continuing without projects");
            ProjectCatalog::default()
        }
        Err(e) => return Err(e).context("failed to load project catalog"),
    };

    let sender = build_sender(&config)?;
    let sink = build_sink(&config);
    let responders = build_responders(&config.llm);

    let state = AppState::with_components(config.clone(), catalog, sender, sink, responders);

    // idle_ttl_secs = 0 keeps conversations; the sweep still prunes locks
    let sweeper = start_idle_sweeper(
        Arc::clone(state.states()),
        Duration::from_secs(config.conversation.idle_ttl_secs),
        Duration::from_secs(config.conversation.sweep_interval_secs.max(1)),
    );

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = sweeper.send(true);
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graph API sender when credentials are present, otherwise log-only
fn build_sender(config: &Settings) -> anyhow::Result<Arc<dyn OutboundSender>> {
    if config.whatsapp.dry_run {
        tracing::info!("WhatsApp dry run: replies are logged, not sent");
        return Ok(Arc::new(LogOnlySender::new()));
    }
    if !config.whatsapp.has_credentials() {
        if config.environment.is_strict() {
            anyhow::bail!("WhatsApp credentials are required outside development");
        }
        tracing::warn!("WhatsApp credentials missing, replies are logged only");
        return Ok(Arc::new(LogOnlySender::new()));
    }
    Ok(Arc::new(WhatsAppSender::new(&config.whatsapp)?))
}

fn build_sink(config: &Settings) -> Arc<dyn HandoffSink> {
    match config.handoff.sink {
        HandoffSinkKind::Log => Arc::new(LogHandoffSink::new()),
        HandoffSinkKind::Jsonl => {
            tracing::info!(path = %config.handoff.jsonl_path, "Handoff events appended to file");
            Arc::new(JsonlHandoffSink::new(&config.handoff.jsonl_path))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("lead_agent={},tower_http=info", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
