//! Messages and reactions.

use async_trait::async_trait;
use uuid::Uuid;

use murmur_core::AppResult;
use murmur_entity::message::{Message, MessageKind, Reaction};

/// The message collaborator.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message and bump the conversation's `updated_at`. The
    /// returned message carries the sender profile.
    async fn create_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
        kind: MessageKind,
    ) -> AppResult<Message>;

    /// A page of a conversation's messages with senders and reactions.
    /// `offset` counts back from the newest message; the page itself is in
    /// chronological order.
    async fn list_messages(
        &self,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Message>>;

    /// Find a message by id.
    async fn find_message(&self, message_id: Uuid) -> AppResult<Option<Message>>;

    /// Delete a message. Allowed for its sender and for the group owner.
    async fn delete_message(&self, message_id: Uuid, requester_id: Uuid) -> AppResult<Message>;

    /// Add a reaction; re-adding the same emoji is idempotent.
    async fn add_reaction(&self, message_id: Uuid, user_id: Uuid, emoji: &str)
    -> AppResult<Reaction>;

    /// Remove a reaction.
    async fn remove_reaction(&self, message_id: Uuid, user_id: Uuid, emoji: &str)
    -> AppResult<()>;
}
