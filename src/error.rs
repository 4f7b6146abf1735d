//! Error types for leadflow.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Conversation store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Conversation for sender {sender_id} has unrecognized state {state:?}")]
    InvalidState { sender_id: String, state: String },
}

/// Outbound message delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// Lead sink errors.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Sink request failed: {0}")]
    RequestFailed(String),

    #[error("Sink rejected row (status {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
