//! Handoff sinks
//!
//! - `LogHandoffSink`: structured tracing event, for development
//! - `JsonlHandoffSink`: appends one lead record per line to a file

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lead_agent_core::{mask_phone, HandoffEvent, HandoffSink, Result};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::PersistenceError;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogHandoffSink;

impl LogHandoffSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HandoffSink for LogHandoffSink {
    async fn notify(&self, event: &HandoffEvent) -> Result<()> {
        tracing::info!(
            handoff_id = %event.id,
            phone = %mask_phone(&event.phone),
            reason = %event.reason,
            score = event.score,
            rank = event.rank.as_str(),
            budget = event.slots.budget.as_deref().unwrap_or("-"),
            location = event.slots.location.as_deref().unwrap_or("-"),
            "Lead handed off to advisor"
        );
        Ok(())
    }
}

/// Appends handoff events as JSON lines.
///
/// Writes are serialized through an async mutex so concurrent handoffs
/// never interleave within a line.
#[derive(Debug)]
pub struct JsonlHandoffSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlHandoffSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, event: &HandoffEvent) -> std::result::Result<(), PersistenceError> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl HandoffSink for JsonlHandoffSink {
    async fn notify(&self, event: &HandoffEvent) -> Result<()> {
        self.append(event).await.map_err(|e| {
            tracing::error!(
                path = %self.path.display(),
                phone = %mask_phone(&event.phone),
                error = %e,
                "Failed to record handoff"
            );
            lead_agent_core::Error::Handoff(e.to_string())
        })?;
        tracing::info!(
            handoff_id = %event.id,
            phone = %mask_phone(&event.phone),
            reason = %event.reason,
            "Lead recorded"
        );
        Ok(())
    }
}
