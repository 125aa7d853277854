//! Conversations and membership.

use async_trait::async_trait;
use uuid::Uuid;

use murmur_core::AppResult;
use murmur_entity::conversation::ConversationWithDetails;

/// The conversation collaborator.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Every conversation `user_id` participates in, most recent first.
    async fn user_conversations(&self, user_id: Uuid) -> AppResult<Vec<ConversationWithDetails>>;

    /// Ids of every participant of a conversation.
    async fn participant_ids(&self, conversation_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Whether `user_id` participates in the conversation.
    async fn is_participant(&self, conversation_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// A conversation with participants and latest message.
    async fn find_conversation(
        &self,
        conversation_id: Uuid,
    ) -> AppResult<Option<ConversationWithDetails>>;

    /// Find the DM between two users, creating it when absent. The flag
    /// is `true` when the conversation was created by this call.
    async fn get_or_create_dm(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> AppResult<(ConversationWithDetails, bool)>;

    /// Create a group owned by `owner_id` containing the owner and `members`.
    async fn create_group(
        &self,
        owner_id: Uuid,
        name: &str,
        members: &[Uuid],
    ) -> AppResult<ConversationWithDetails>;

    /// Add users to a group; `requester_id` must already participate.
    /// Returns only the users that were not members before.
    async fn add_participants(
        &self,
        conversation_id: Uuid,
        requester_id: Uuid,
        user_ids: &[Uuid],
    ) -> AppResult<Vec<Uuid>>;

    /// Rename a group. Only the owner (or anyone, for ownerless groups) may rename.
    async fn rename_group(&self, conversation_id: Uuid, requester_id: Uuid, name: &str)
    -> AppResult<()>;

    /// Remove `user_id` from a group.
    async fn leave_group(&self, conversation_id: Uuid, user_id: Uuid) -> AppResult<()>;
}
