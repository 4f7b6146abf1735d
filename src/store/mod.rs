//! Persistence layer — one conversation record per sender.

pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use memory::MemoryStore;
pub use traits::{Conversation, ConversationPatch, ConversationStore};
