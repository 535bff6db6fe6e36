use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An inbound operator message from the messaging channel.
///
/// Channels strip any richer payload (attachments, formatting, group
/// metadata) before the message reaches the core: all the state machine
/// ever consumes is `chat_id` + `text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Chat identifier — doubles as the client identifier.
    pub chat_id: String,
    /// Message text content.
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// An outbound notification to send through the messaging channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Chat identifier to deliver to.
    pub chat_id: String,
    pub text: String,
}

impl OutgoingMessage {
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
        }
    }
}
