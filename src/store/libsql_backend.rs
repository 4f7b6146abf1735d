//! libSQL backend — async `ConversationStore` implementation.
//!
//! Supports local file and in-memory databases. The file variant is the
//! production store: a conversation spans multiple webhook deliveries and
//! must survive a process restart.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::flow::state::ConvState;
use crate::store::migrations;
use crate::store::traits::{Conversation, ConversationPatch, ConversationStore};

/// libSQL conversation store.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;
        info!(path = %path.display(), "Conversation database opened");

        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;

        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Parse an RFC 3339 datetime string written by this backend.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::<Utc>::MIN_UTC)
}

/// Convert `Option<String>` to a libsql Value.
fn opt_text_owned(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

/// Map a libsql row to a Conversation.
///
/// Column order matches CONVERSATION_COLUMNS. A state cell that no longer
/// parses is surfaced as `InvalidState`, never coerced to a valid state.
fn row_to_conversation(row: &libsql::Row) -> Result<Conversation, StoreError> {
    let sender_id: String = row
        .get(0)
        .map_err(|e| StoreError::Query(format!("conversation row parse: {e}")))?;
    let state_str: String = row
        .get(1)
        .map_err(|e| StoreError::Query(format!("conversation row parse: {e}")))?;
    let state = ConvState::parse(&state_str).ok_or_else(|| StoreError::InvalidState {
        sender_id: sender_id.clone(),
        state: state_str,
    })?;
    let updated_str: String = row
        .get(6)
        .map_err(|e| StoreError::Query(format!("conversation row parse: {e}")))?;

    Ok(Conversation {
        sender_id,
        state,
        name: row.get(2).ok(),
        phone: row.get(3).ok(),
        goal: row.get(4).ok(),
        notes: row.get(5).ok(),
        last_updated: parse_datetime(&updated_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const CONVERSATION_COLUMNS: &str = "sender_id, state, name, phone, goal, notes, last_updated";

#[async_trait]
impl ConversationStore for LibSqlBackend {
    async fn get(&self, sender_id: &str) -> Result<Option<Conversation>, StoreError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE sender_id = ?1"),
                params![sender_id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_conversation(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get: {e}"))),
        }
    }

    async fn upsert(&self, sender_id: &str, patch: ConversationPatch) -> Result<(), StoreError> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();

        // Single atomic statement: absent patch fields fall back to the
        // stored value via COALESCE, so a concurrent reader never observes
        // a half-applied update.
        conn.execute(
            "INSERT INTO conversations (sender_id, state, name, phone, goal, notes, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(sender_id) DO UPDATE SET
                 state = COALESCE(excluded.state, state),
                 name = COALESCE(excluded.name, name),
                 phone = COALESCE(excluded.phone, phone),
                 goal = COALESCE(excluded.goal, goal),
                 notes = COALESCE(excluded.notes, notes),
                 last_updated = excluded.last_updated",
            params![
                sender_id,
                opt_text_owned(patch.state.map(|s| s.as_str().to_string())),
                opt_text_owned(patch.name),
                opt_text_owned(patch.phone),
                opt_text_owned(patch.goal),
                opt_text_owned(patch.notes),
                now,
            ],
        )
        .await
        .map_err(|e| StoreError::Query(format!("upsert: {e}")))?;

        debug!(sender_id, "Conversation upserted");
        Ok(())
    }

    async fn delete(&self, sender_id: &str) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute(
            "DELETE FROM conversations WHERE sender_id = ?1",
            params![sender_id],
        )
        .await
        .map_err(|e| StoreError::Query(format!("delete: {e}")))?;

        debug!(sender_id, "Conversation deleted");
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
