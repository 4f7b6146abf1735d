//! Drives the state machine: store reads/writes, lead submission, and
//! outbound replies, serialized per sender.
//!
//! Nothing here propagates an error past `handle_message` — every failure
//! is scoped to one sender's one message and logged.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::error::StoreError;
use crate::flow::engine::{self, MSG_FALLBACK, MSG_LEAD_SAVED, MSG_SINK_FAILED, Outcome};
use crate::flow::locks::SenderLocks;
use crate::outbound::MessageSender;
use crate::sink::LeadSink;
use crate::store::ConversationStore;

/// Owns the store and the two external adapters.
pub struct FlowRunner {
    store: Arc<dyn ConversationStore>,
    sender: Arc<dyn MessageSender>,
    sink: Arc<dyn LeadSink>,
    locks: SenderLocks,
}

impl FlowRunner {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        sender: Arc<dyn MessageSender>,
        sink: Arc<dyn LeadSink>,
    ) -> Self {
        Self {
            store,
            sender,
            sink,
            locks: SenderLocks::new(),
        }
    }

    /// Handle one inbound text from one sender.
    ///
    /// The whole get-advance-persist sequence runs under the sender's
    /// lock so concurrent deliveries for the same sender cannot race.
    pub async fn handle_message(&self, sender_id: &str, text: &str) {
        let guard = self.locks.acquire(sender_id).await;
        self.handle_locked(sender_id, text).await;
        drop(guard);
        self.locks.release(sender_id);
    }

    async fn handle_locked(&self, sender_id: &str, text: &str) {
        let conv = match self.store.get(sender_id).await {
            Ok(conv) => conv,
            Err(StoreError::InvalidState { ref state, .. }) => {
                warn!(sender_id, state = %state, "Conversation has unrecognized state");
                self.deliver(sender_id, MSG_FALLBACK).await;
                return;
            }
            Err(e) => {
                error!(sender_id, error = %e, "Failed to load conversation");
                return;
            }
        };

        match engine::advance(conv.as_ref(), sender_id, text, Utc::now()) {
            Outcome::Advance { patch, reply } => {
                if let Err(e) = self.store.upsert(sender_id, patch).await {
                    error!(sender_id, error = %e, "Failed to persist conversation");
                    return;
                }
                self.deliver(sender_id, &reply).await;
            }
            Outcome::Reply { reply } => {
                self.deliver(sender_id, &reply).await;
            }
            Outcome::Complete { lead } => {
                let reply = match self.sink.append(&lead).await {
                    Ok(()) => MSG_LEAD_SAVED,
                    Err(e) => {
                        // Notify-and-drop: the record is deleted below
                        // regardless, and the captured lead goes with it.
                        warn!(sender_id, error = %e, "Lead sink append failed");
                        MSG_SINK_FAILED
                    }
                };
                self.deliver(sender_id, reply).await;
                if let Err(e) = self.store.delete(sender_id).await {
                    error!(sender_id, error = %e, "Failed to delete completed conversation");
                }
            }
        }
    }

    async fn deliver(&self, recipient_id: &str, text: &str) {
        match self.sender.send(recipient_id, text).await {
            Ok(receipt) => {
                debug!(recipient_id, status = receipt.status, "Outbound message sent");
            }
            Err(e) => {
                warn!(recipient_id, error = %e, "Outbound message failed");
            }
        }
    }
}
