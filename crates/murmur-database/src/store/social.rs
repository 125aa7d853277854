//! Friends and friend requests.

use async_trait::async_trait;
use uuid::Uuid;

use murmur_core::AppResult;
use murmur_entity::friendship::{
    Block, BlockWithUser, FriendRequest, FriendRequestWithUser, FriendWithUser,
};

/// The social-graph collaborator.
#[async_trait]
pub trait SocialGraphStore: Send + Sync {
    /// Ids of every accepted friend of `user_id`.
    async fn friend_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Accepted friends with their profiles.
    async fn friends(&self, user_id: Uuid) -> AppResult<Vec<FriendWithUser>>;

    /// Pending requests addressed to `user_id`, with the sender's profile.
    async fn incoming_requests(&self, user_id: Uuid) -> AppResult<Vec<FriendRequestWithUser>>;

    /// Pending requests sent by `user_id`, with the recipient's profile.
    async fn outgoing_requests(&self, user_id: Uuid) -> AppResult<Vec<FriendRequestWithUser>>;

    /// Find a request by id.
    async fn find_request(&self, request_id: Uuid) -> AppResult<Option<FriendRequest>>;

    /// A request as seen by `viewer_id`: the embedded user is the other party.
    async fn request_with_user(
        &self,
        request_id: Uuid,
        viewer_id: Uuid,
    ) -> AppResult<Option<FriendRequestWithUser>>;

    /// The friendship between `user_id` and `friend_id`, from `user_id`'s side.
    async fn find_friend(&self, user_id: Uuid, friend_id: Uuid) -> AppResult<Option<FriendWithUser>>;

    /// Send a request. When `to` already has a pending request to `from`,
    /// that request is accepted instead and returned with status
    /// `accepted`. Fails with `Authorization` when either user blocks the
    /// other.
    async fn send_request(&self, from: Uuid, to: Uuid) -> AppResult<FriendRequest>;

    /// Accept a pending request addressed to `user_id`.
    async fn accept_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<FriendRequest>;

    /// Decline a pending request addressed to `user_id`.
    async fn decline_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<FriendRequest>;

    /// Withdraw a pending request sent by `user_id`. Returns the deleted row.
    async fn cancel_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<FriendRequest>;

    /// Remove an accepted friendship in either direction.
    async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> AppResult<()>;

    /// Block `blocked_id`, deleting every request or friendship between the
    /// pair. Blocking twice keeps the original row. Returns the block and
    /// the deleted request rows.
    async fn block_user(&self, blocker_id: Uuid, blocked_id: Uuid)
    -> AppResult<(Block, Vec<FriendRequest>)>;

    /// Lift a block placed by `blocker_id`.
    async fn unblock_user(&self, blocker_id: Uuid, blocked_id: Uuid) -> AppResult<()>;

    /// Blocks placed by `blocker_id`, newest first.
    async fn blocked_users(&self, blocker_id: Uuid) -> AppResult<Vec<BlockWithUser>>;

    /// Whether either user blocks the other.
    async fn is_blocked(&self, a: Uuid, b: Uuid) -> AppResult<bool>;
}
