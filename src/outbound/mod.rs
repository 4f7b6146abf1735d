//! Outbound message delivery to the messaging platform.

pub mod graph;

use async_trait::async_trait;

use crate::error::ChannelError;

pub use graph::GraphSender;

/// Receipt from a completed send attempt. Non-2xx statuses are carried
/// here rather than turned into errors — the platform's response body is
/// only ever logged.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub status: u16,
    pub body: String,
}

/// Delivers an outbound text to a sender on the messaging platform.
///
/// Errors are transport-level only; they are logged by the caller and
/// never affect conversation state.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, recipient_id: &str, text: &str) -> Result<SendReceipt, ChannelError>;
}
