//! Lead sink — durable external storage for completed leads.

pub mod sheets;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::SinkError;

pub use sheets::SheetsSink;

/// A completed lead, ready for external storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Lead {
    pub timestamp: DateTime<Utc>,
    pub sender_id: String,
    pub name: String,
    pub phone: String,
    pub goal: String,
    pub notes: String,
}

impl Lead {
    /// Row layout expected by the sheet:
    /// `[timestamp, sender_id, name, phone, goal, notes]`.
    pub fn as_row(&self) -> [String; 6] {
        [
            self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            self.sender_id.clone(),
            self.name.clone(),
            self.phone.clone(),
            self.goal.clone(),
            self.notes.clone(),
        ]
    }
}

/// Appends a completed lead to durable external storage.
///
/// Called exactly once per conversation, at the terminal step. The caller
/// consumes the outcome explicitly — failure turns into a user-facing
/// apology, never a process error.
#[async_trait]
pub trait LeadSink: Send + Sync {
    async fn append(&self, lead: &Lead) -> Result<(), SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn lead_row_layout() {
        let lead = Lead {
            timestamp: Utc.with_ymd_and_hms(2026, 8, 7, 12, 30, 45).unwrap(),
            sender_id: "u1".to_string(),
            name: "Jane Doe".to_string(),
            phone: "555-123-4567".to_string(),
            goal: "lose fat".to_string(),
            notes: String::new(),
        };

        assert_eq!(
            lead.as_row(),
            [
                "2026-08-07 12:30:45",
                "u1",
                "Jane Doe",
                "555-123-4567",
                "lose fat",
                "",
            ]
        );
    }
}
