//! Wire protocol types for the relay
//!
//! One JSON object per WebSocket text frame. Inbound frames are tagged by
//! `type` and dispatched exhaustively; unknown tags are accepted but ignored.
//! Outbound frames reproduce the exact shapes clients expect, including the
//! join acknowledgment nested inside a `system` frame.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display name attached to broadcasts. There is no identity layer, so every
/// sender appears under the same name.
pub const SENDER_NAME: &str = "User";

/// System message sent once per connection on open.
pub const WELCOME_MESSAGE: &str = "Welcome! Join a channel to start chatting.";

/// System notification sent to existing members when someone joins.
pub const MEMBER_JOINED_MESSAGE: &str = "A new user has joined the channel";

/// System notification sent to remaining members when someone disconnects.
pub const MEMBER_LEFT_MESSAGE: &str = "A user has left the channel";

/// Error reply for a join with a missing or empty channel name.
pub const ERR_INVALID_CHANNEL: &str = "A valid channel name is required to join";

/// Error reply for publishing to a channel the sender has not joined.
pub const ERR_NOT_JOINED: &str = "You must join the channel before sending messages";

/// A frame received from a client.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundFrame {
    /// Join a named channel: `{"type":"join","channel":"room1","id":1}`
    Join {
        #[serde(default)]
        channel: String,
        #[serde(default)]
        id: Option<Value>,
    },

    /// Publish a payload to a channel:
    /// `{"type":"message","channel":"room1","id":2,"message":"hi"}`
    #[serde(rename = "message")]
    Publish {
        #[serde(default)]
        channel: String,
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        message: Value,
    },

    /// Any other tag. Parsed successfully but never acted on.
    #[serde(other)]
    Unknown,
}

/// Body of a join acknowledgment, nested in a `system` frame.
#[derive(Clone, Debug, Serialize)]
pub struct JoinAckBody {
    pub id: Option<Value>,
    pub result: String,
    pub error: Option<String>,
}

/// Body of a publish acknowledgment, nested in a `response` frame.
#[derive(Clone, Debug, Serialize)]
pub struct PublishAckBody {
    pub result: String,
    pub error: Option<String>,
}

/// Payload of a `system` frame: either plain text or a join acknowledgment.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum SystemBody {
    Text(String),
    JoinAck(JoinAckBody),
}

/// A frame sent to a client.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundFrame {
    /// Server-originated notification or join acknowledgment.
    System {
        message: SystemBody,
        #[serde(skip_serializing_if = "Option::is_none")]
        channel: Option<String>,
    },

    /// Protocol error reported to the offending sender only.
    Error { message: String },

    /// Publish acknowledgment echoing the client-supplied request id.
    Response {
        id: Option<Value>,
        message: PublishAckBody,
        channel: String,
    },

    /// A member's payload fanned out to the rest of the channel.
    Broadcast {
        message: Value,
        sender: String,
        channel: String,
    },
}

impl OutboundFrame {
    /// Welcome frame sent on connection open. Carries no channel.
    pub fn welcome() -> Self {
        OutboundFrame::System {
            message: SystemBody::Text(WELCOME_MESSAGE.to_string()),
            channel: None,
        }
    }

    /// Plain confirmation text sent to the joiner before the ack.
    pub fn joined(channel: &str) -> Self {
        OutboundFrame::System {
            message: SystemBody::Text(format!("Joined channel: {}", channel)),
            channel: Some(channel.to_string()),
        }
    }

    /// Join acknowledgment echoing the request id.
    pub fn join_ack(channel: &str, id: Option<Value>) -> Self {
        OutboundFrame::System {
            message: SystemBody::JoinAck(JoinAckBody {
                id,
                result: format!("Connected to channel: {}", channel),
                error: None,
            }),
            channel: Some(channel.to_string()),
        }
    }

    /// Notification to existing members that someone joined.
    pub fn member_joined(channel: &str) -> Self {
        OutboundFrame::System {
            message: SystemBody::Text(MEMBER_JOINED_MESSAGE.to_string()),
            channel: Some(channel.to_string()),
        }
    }

    /// Notification to remaining members that someone left.
    pub fn member_left(channel: &str) -> Self {
        OutboundFrame::System {
            message: SystemBody::Text(MEMBER_LEFT_MESSAGE.to_string()),
            channel: Some(channel.to_string()),
        }
    }

    /// Publish acknowledgment echoing the request id.
    pub fn publish_ack(channel: &str, id: Option<Value>) -> Self {
        OutboundFrame::Response {
            id,
            message: PublishAckBody {
                result: "Message sent".to_string(),
                error: None,
            },
            channel: channel.to_string(),
        }
    }

    /// Broadcast carrying the payload verbatim.
    pub fn broadcast(channel: &str, payload: Value) -> Self {
        OutboundFrame::Broadcast {
            message: payload,
            sender: SENDER_NAME.to_string(),
            channel: channel.to_string(),
        }
    }

    /// Protocol error frame.
    pub fn error(message: &str) -> Self {
        OutboundFrame::Error {
            message: message.to_string(),
        }
    }
}
