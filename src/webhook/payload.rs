//! Payload normalizer — extracts `(sender_id, text)` pairs from inbound
//! webhook envelopes.
//!
//! The platform delivers two entry shapes in practice: page-style entries
//! with a `messaging` array, and business-account entries with `changes`
//! wrapping a `messages` array. Both are modeled as an untagged union;
//! anything else falls into `Unrecognized` and is skipped, never an error.

use serde::Deserialize;
use tracing::debug;

/// One normalized inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Entry {
    Messaging { messaging: Vec<MessagingEvent> },
    Changes { changes: Vec<Change> },
    Unrecognized(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct MessagingEvent {
    sender: Option<Sender>,
    message: Option<MessageBody>,
}

#[derive(Debug, Deserialize)]
struct Sender {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Change {
    #[serde(default)]
    value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    messages: Vec<DirectMessage>,
}

#[derive(Debug, Deserialize)]
struct DirectMessage {
    from: Option<String>,
    text: Option<TextField>,
}

/// The `text` field arrives either as a plain string or as an object with
/// a `body`. Anything else is dropped with the message.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextField {
    Plain(String),
    Object { body: String },
    Other(serde_json::Value),
}

impl TextField {
    fn into_text(self) -> Option<String> {
        match self {
            TextField::Plain(text) => Some(text),
            TextField::Object { body } => Some(body),
            TextField::Other(_) => None,
        }
    }
}

/// Extract all `(sender_id, text)` pairs from a webhook body, in delivery
/// order. A body that matches no known shape yields an empty list.
pub fn normalize(body: &serde_json::Value) -> Vec<InboundMessage> {
    let envelope: Envelope = match serde_json::from_value(body.clone()) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!(error = %e, "Webhook body matches no known envelope shape");
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    for entry in envelope.entry {
        match entry {
            Entry::Messaging { messaging } => {
                for event in messaging {
                    let (Some(sender), Some(message)) = (event.sender, event.message) else {
                        continue;
                    };
                    let Some(text) = message.text else {
                        continue;
                    };
                    out.push(InboundMessage {
                        sender_id: sender.id,
                        text,
                    });
                }
            }
            Entry::Changes { changes } => {
                for change in changes {
                    for message in change.value.messages {
                        let Some(from) = message.from else {
                            continue;
                        };
                        let Some(text) = message.text.and_then(TextField::into_text) else {
                            continue;
                        };
                        // Business-account deliveries carry empty strings
                        // for some event kinds; those are not messages.
                        if from.is_empty() || text.is_empty() {
                            continue;
                        }
                        out.push(InboundMessage {
                            sender_id: from,
                            text,
                        });
                    }
                }
            }
            Entry::Unrecognized(_) => {
                debug!("Skipping unrecognized webhook entry");
            }
        }
    }
    out
}
