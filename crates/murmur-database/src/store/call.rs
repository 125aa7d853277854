//! Call session persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use murmur_core::AppResult;
use murmur_entity::call::{ActiveCall, Call};

/// The call persistence collaborator.
///
/// Mutating methods are atomic compare-and-swap steps. Callers compose
/// them into start/join/leave/end and must treat a lost race (for example
/// `try_end` returning `None`) as a normal outcome.
#[async_trait]
pub trait CallStore: Send + Sync {
    /// Find a call by id.
    async fn find_call(&self, call_id: Uuid) -> AppResult<Option<Call>>;

    /// The active call of a conversation, if any.
    async fn find_active_for_conversation(&self, conversation_id: Uuid) -> AppResult<Option<Call>>;

    /// The active call `user_id` currently holds a live membership in.
    async fn find_active_for_user(&self, user_id: Uuid) -> AppResult<Option<Call>>;

    /// Ids of users with a live membership row, in join order.
    async fn active_participants(&self, call_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Active calls (with live participants) for the given conversations.
    async fn active_calls_for_conversations(
        &self,
        conversation_ids: &[Uuid],
    ) -> AppResult<Vec<ActiveCall>>;

    /// Create an active call for the conversation with `starter_id` as its
    /// sole participant, unless one already exists. Returns the active call
    /// and `true` when this invocation created it. Fails with `Gone` when
    /// the existing call ended before it could be read back.
    async fn start_or_get_active(
        &self,
        conversation_id: Uuid,
        starter_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<(Call, bool)>;

    /// Give `user_id` a live membership row. Returns `false` when one
    /// already existed. Fails with `NotFound` for an unknown call and `Gone`
    /// for an ended one.
    async fn add_participant(&self, call_id: Uuid, user_id: Uuid, now: DateTime<Utc>)
    -> AppResult<bool>;

    /// Close `user_id`'s live membership row. Returns `false` when there
    /// was none.
    async fn mark_left(&self, call_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> AppResult<bool>;

    /// Number of live membership rows.
    async fn count_active_participants(&self, call_id: Uuid) -> AppResult<i64>;

    /// Set `ended_at` from null to `now`.
    ///
    /// Without `force` the swap only happens when no live membership rows
    /// remain; with `force` any remaining rows are closed first. Returns the
    /// ended call only to the single caller whose swap succeeded.
    async fn try_end(&self, call_id: Uuid, now: DateTime<Utc>, force: bool)
    -> AppResult<Option<Call>>;

    /// Distinct ids of every user that ever joined, in first-join order.
    async fn participant_history(&self, call_id: Uuid) -> AppResult<Vec<Uuid>>;
}
