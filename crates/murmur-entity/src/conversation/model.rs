//! Conversation entity and read model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::ConversationKind;
use crate::message::Message;
use crate::user::User;

/// A conversation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    /// Conversation identifier.
    pub id: Uuid,
    /// DM or group.
    #[serde(rename = "type")]
    pub kind: ConversationKind,
    /// Group name.
    pub name: Option<String>,
    /// Group avatar URL.
    pub avatar_url: Option<String>,
    /// Group owner.
    pub owner_id: Option<Uuid>,
    /// When the conversation was created.
    pub created_at: DateTime<Utc>,
    /// Bumped on every new message or group change.
    pub updated_at: DateTime<Utc>,
}

/// A conversation with its participants and latest message, as delivered
/// to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationWithDetails {
    /// Conversation identifier.
    pub id: Uuid,
    /// DM or group.
    #[serde(rename = "type")]
    pub kind: ConversationKind,
    /// Group name.
    pub name: Option<String>,
    /// Group avatar URL.
    pub avatar_url: Option<String>,
    /// Group owner.
    pub owner_id: Option<Uuid>,
    /// Current participants.
    pub participants: Vec<User>,
    /// Most recent message, if any.
    pub last_message: Option<Message>,
    /// Last activity.
    pub updated_at: DateTime<Utc>,
}

impl ConversationWithDetails {
    /// Assemble the read model from its parts.
    pub fn new(conversation: Conversation, participants: Vec<User>, last_message: Option<Message>) -> Self {
        Self {
            id: conversation.id,
            kind: conversation.kind,
            name: conversation.name,
            avatar_url: conversation.avatar_url,
            owner_id: conversation.owner_id,
            participants,
            last_message,
            updated_at: conversation.updated_at,
        }
    }

    /// Ids of every participant.
    pub fn participant_ids(&self) -> Vec<Uuid> {
        self.participants.iter().map(|u| u.id).collect()
    }
}
