//! Conversation kind enumeration.

use serde::{Deserialize, Serialize};

/// Whether a conversation is a two-party DM or a named group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "conversation_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    /// Direct message between exactly two users.
    Dm,
    /// Group conversation with an owner.
    Group,
}
