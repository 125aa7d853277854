//! Inbound and outbound WebSocket frame definitions and event discriminators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Frames sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Subscribe to a channel.
    Subscribe {
        /// Channel name.
        channel: String,
    },
    /// Unsubscribe from a channel.
    Unsubscribe {
        /// Channel name.
        channel: String,
    },
    /// Keepalive.
    Ping,
}

/// Control frames sent by the server to the client.
///
/// Publications are not wrapped in this type; they are forwarded to the
/// socket exactly as they were published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Subscription confirmed.
    Subscribed {
        /// Channel name.
        channel: String,
    },
    /// Unsubscription confirmed.
    Unsubscribed {
        /// Channel name.
        channel: String,
    },
    /// A request was refused.
    Error {
        /// Machine-readable code.
        code: String,
        /// Human-readable message.
        message: String,
    },
    /// Reply to a ping.
    Pong,
}

/// Discriminator of every event published to user channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Initial snapshot after subscribing.
    Ready,
    /// A friend went online or offline.
    PresenceUpdate,
    /// A friend request arrived.
    FriendRequestCreate,
    /// A friend request was accepted, declined, or cancelled.
    FriendRequestDelete,
    /// A friendship was established.
    RelationshipAdd,
    /// A friendship was removed.
    RelationshipRemove,
    /// A message was posted.
    MessageCreate,
    /// A message was deleted.
    MessageDelete,
    /// A reaction was added.
    ReactionAdd,
    /// A reaction was removed.
    ReactionRemove,
    /// The user was added to a conversation.
    ConversationCreate,
    /// A conversation's details or membership changed.
    ConversationUpdate,
    /// A conversation's active call changed.
    CallState,
}

impl EventType {
    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::PresenceUpdate => "PRESENCE_UPDATE",
            Self::FriendRequestCreate => "FRIEND_REQUEST_CREATE",
            Self::FriendRequestDelete => "FRIEND_REQUEST_DELETE",
            Self::RelationshipAdd => "RELATIONSHIP_ADD",
            Self::RelationshipRemove => "RELATIONSHIP_REMOVE",
            Self::MessageCreate => "MESSAGE_CREATE",
            Self::MessageDelete => "MESSAGE_DELETE",
            Self::ReactionAdd => "REACTION_ADD",
            Self::ReactionRemove => "REACTION_REMOVE",
            Self::ConversationCreate => "CONVERSATION_CREATE",
            Self::ConversationUpdate => "CONVERSATION_UPDATE",
            Self::CallState => "CALL_STATE",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_frames_parse() {
        let frame: InboundMessage =
            serde_json::from_str(r#"{"type":"subscribe","channel":"user:x"}"#).unwrap();
        assert_eq!(
            frame,
            InboundMessage::Subscribe {
                channel: "user:x".into()
            }
        );
        let frame: InboundMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(frame, InboundMessage::Ping);
    }

    #[test]
    fn event_names_match_serde() {
        for event in [
            EventType::Ready,
            EventType::PresenceUpdate,
            EventType::FriendRequestDelete,
            EventType::ConversationCreate,
            EventType::CallState,
        ] {
            let json = serde_json::to_value(event).unwrap();
            assert_eq!(json, serde_json::Value::String(event.as_str().to_string()));
        }
    }

    #[test]
    fn error_frame_shape() {
        let frame = OutboundMessage::Error {
            code: "AUTHORIZATION".into(),
            message: "nope".into(),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "AUTHORIZATION");
    }
}
