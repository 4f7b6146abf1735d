//! `ConversationStore` trait — single async interface for conversation persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::flow::state::ConvState;

/// One in-flight conversation, keyed by sender.
///
/// At most one record exists per sender at any time. Captured fields are
/// populated monotonically as the script advances; only record deletion
/// clears them.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub sender_id: String,
    pub state: ConvState,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub goal: Option<String>,
    pub notes: Option<String>,
    pub last_updated: DateTime<Utc>,
}

/// Partial-field update for a conversation record.
///
/// `None` fields keep their stored value; populated fields overwrite it.
/// `last_updated` is refreshed on every upsert regardless.
#[derive(Debug, Clone, Default)]
pub struct ConversationPatch {
    pub state: Option<ConvState>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub goal: Option<String>,
    pub notes: Option<String>,
}

impl ConversationPatch {
    /// Patch that moves the conversation to `state`.
    pub fn state(state: ConvState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Backend-agnostic conversation persistence.
///
/// All operations are keyed by exact `sender_id` match. Callers that do a
/// get-modify-upsert sequence must hold the per-sender lock (see
/// `flow::locks`) — the store itself only guarantees that each single
/// operation is atomic.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Point lookup. `Ok(None)` means no active conversation.
    async fn get(&self, sender_id: &str) -> Result<Option<Conversation>, StoreError>;

    /// Create-or-update: absent fields in the patch keep their stored
    /// values, `last_updated` is refreshed, `sender_id` is immutable.
    async fn upsert(&self, sender_id: &str, patch: ConversationPatch) -> Result<(), StoreError>;

    /// Remove the record if present; a no-op when absent.
    async fn delete(&self, sender_id: &str) -> Result<(), StoreError>;
}
