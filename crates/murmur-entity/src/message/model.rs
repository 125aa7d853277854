//! Message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::reaction::Reaction;
use crate::user::User;

/// What a message body contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain user-authored text.
    Text,
    /// System message summarizing a finished call; the body is
    /// JSON-encoded [`super::CallMessageContent`].
    Call,
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Message identifier.
    pub id: Uuid,
    /// Owning conversation.
    pub conversation_id: Uuid,
    /// Author.
    pub sender_id: Uuid,
    /// Body text (JSON for call messages).
    pub content: String,
    /// Message kind.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// When the message was sent.
    pub created_at: DateTime<Utc>,
    /// When the message was last edited.
    pub updated_at: DateTime<Utc>,
    /// Author profile, filled in by read paths.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sender: Option<User>,
    /// Reactions on the message.
    #[sqlx(skip)]
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}
