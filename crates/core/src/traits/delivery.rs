//! Outbound delivery and handoff notification traits

use async_trait::async_trait;

use crate::{DeliveryReceipt, HandoffEvent, Result};

/// Sends a reply back to the user's chat
#[async_trait]
pub trait OutboundSender: Send + Sync {
    async fn send(&self, recipient: &str, text: &str) -> Result<DeliveryReceipt>;
}

/// Receives escalations for human follow-up
#[async_trait]
pub trait HandoffSink: Send + Sync {
    async fn notify(&self, event: &HandoffEvent) -> Result<()>;
}
