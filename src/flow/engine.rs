//! Pure state-transition function for the lead-capture script.
//!
//! `advance()` does no I/O: it maps the current record and one inbound
//! text to an outcome the runner executes against the store and adapters.

use chrono::{DateTime, Utc};

use crate::flow::state::ConvState;
use crate::sink::Lead;
use crate::store::traits::{Conversation, ConversationPatch};

/// Minimum digit characters for a phone number to be accepted.
const MIN_PHONE_DIGITS: usize = 7;

pub const MSG_GREETING: &str =
    "Hey 👋 — I can help book a free trial. What's your full name?";
pub const MSG_PHONE_TOO_SHORT: &str = "That phone number looks short. \
    Please enter your phone number including country or area code.";
pub const MSG_ASK_GOAL: &str =
    "Got it. What's your fitness goal? (e.g., build muscle, lose fat, general fitness)";
pub const MSG_ASK_NOTES: &str = "Any other details we should know? (injuries, preferred \
    workout time, trainer preference). If none, reply 'no'.";
pub const MSG_LEAD_SAVED: &str =
    "Thanks — we saved your details. A staff member will contact you shortly. 🙌";
pub const MSG_SINK_FAILED: &str =
    "Thanks — we saved your details locally but failed to save to the sheet. I'll try again.";
pub const MSG_FALLBACK: &str =
    "Sorry, I didn't understand that. Reply 'start' to begin booking or ask for help.";

/// Result of advancing a conversation by one inbound message.
#[derive(Debug)]
pub enum Outcome {
    /// Persist the patch, then send the reply.
    Advance {
        patch: ConversationPatch,
        reply: String,
    },
    /// Send the reply; the record is unchanged (re-prompt).
    Reply { reply: String },
    /// Terminal step: submit the lead, delete the record regardless of
    /// the sink outcome, reply per that outcome.
    Complete { lead: Lead },
}

/// Advance a conversation by one inbound text.
///
/// `conv` is the stored record, or `None` for an unseen sender. `now` is
/// injected so the lead timestamp is deterministic under test.
pub fn advance(
    conv: Option<&Conversation>,
    sender_id: &str,
    text: &str,
    now: DateTime<Utc>,
) -> Outcome {
    let trimmed = text.trim();

    let Some(conv) = conv else {
        return Outcome::Advance {
            patch: ConversationPatch::state(ConvState::AskName),
            reply: MSG_GREETING.to_string(),
        };
    };

    match conv.state {
        ConvState::AskName => {
            // Greet with the first name only; the record keeps the full string.
            let first = trimmed.split_whitespace().next().unwrap_or(trimmed);
            Outcome::Advance {
                patch: ConversationPatch::state(ConvState::AskPhone).with_name(trimmed),
                reply: format!(
                    "Nice to meet you, {first}! Please share your phone number so we can contact you."
                ),
            }
        }
        ConvState::AskPhone => {
            let digits = trimmed.chars().filter(char::is_ascii_digit).count();
            if digits < MIN_PHONE_DIGITS {
                Outcome::Reply {
                    reply: MSG_PHONE_TOO_SHORT.to_string(),
                }
            } else {
                // Store the raw trimmed input, not just its digits.
                Outcome::Advance {
                    patch: ConversationPatch::state(ConvState::AskGoal).with_phone(trimmed),
                    reply: MSG_ASK_GOAL.to_string(),
                }
            }
        }
        ConvState::AskGoal => Outcome::Advance {
            patch: ConversationPatch::state(ConvState::AskNotes).with_goal(trimmed),
            reply: MSG_ASK_NOTES.to_string(),
        },
        ConvState::AskNotes => {
            let notes = if trimmed.eq_ignore_ascii_case("no") {
                String::new()
            } else {
                trimmed.to_string()
            };
            Outcome::Complete {
                lead: Lead {
                    timestamp: now,
                    sender_id: sender_id.to_string(),
                    name: conv.name.clone().unwrap_or_default(),
                    phone: conv.phone.clone().unwrap_or_default(),
                    goal: conv.goal.clone().unwrap_or_default(),
                    notes,
                },
            }
        }
    }
}
