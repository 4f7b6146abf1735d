//! In-memory `ConversationStore` — HashMap-backed fake for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::store::traits::{Conversation, ConversationPatch, ConversationStore};

/// HashMap-backed store implementing the same contract as the libSQL
/// backend, minus durability. Lets the engine and runner be tested
/// without touching disk.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Conversation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn get(&self, sender_id: &str) -> Result<Option<Conversation>, StoreError> {
        Ok(self.records.lock().await.get(sender_id).cloned())
    }

    async fn upsert(&self, sender_id: &str, patch: ConversationPatch) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let now = Utc::now();

        match records.get_mut(sender_id) {
            Some(conv) => {
                if let Some(state) = patch.state {
                    conv.state = state;
                }
                if patch.name.is_some() {
                    conv.name = patch.name;
                }
                if patch.phone.is_some() {
                    conv.phone = patch.phone;
                }
                if patch.goal.is_some() {
                    conv.goal = patch.goal;
                }
                if patch.notes.is_some() {
                    conv.notes = patch.notes;
                }
                conv.last_updated = now;
            }
            None => {
                let state = patch.state.ok_or_else(|| {
                    StoreError::Query("upsert: cannot create a record without a state".to_string())
                })?;
                records.insert(
                    sender_id.to_string(),
                    Conversation {
                        sender_id: sender_id.to_string(),
                        state,
                        name: patch.name,
                        phone: patch.phone,
                        goal: patch.goal,
                        notes: patch.notes,
                        last_updated: now,
                    },
                );
            }
        }
        Ok(())
    }

    async fn delete(&self, sender_id: &str) -> Result<(), StoreError> {
        self.records.lock().await.remove(sender_id);
        Ok(())
    }
}
