//! Friend request entity and read models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::FriendRequestStatus;
use crate::user::User;

/// A friend request row. An accepted request is the friendship itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FriendRequest {
    /// Request identifier.
    pub id: Uuid,
    /// User who sent the request.
    pub from_user_id: Uuid,
    /// User who received the request.
    pub to_user_id: Uuid,
    /// Current status.
    pub status: FriendRequestStatus,
    /// When the request was sent.
    pub created_at: DateTime<Utc>,
    /// When the request last changed status.
    pub updated_at: DateTime<Utc>,
}

impl FriendRequest {
    /// The other side of the request as seen by `user_id`.
    pub fn counterpart(&self, user_id: Uuid) -> Uuid {
        if self.from_user_id == user_id {
            self.to_user_id
        } else {
            self.from_user_id
        }
    }

    /// Whether `user_id` is either side of the request.
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.from_user_id == user_id || self.to_user_id == user_id
    }
}

/// A friend as seen from one side of an accepted request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendWithUser {
    /// Id of the underlying accepted request.
    pub friendship_id: Uuid,
    /// The friend's profile.
    pub user: User,
    /// When the friendship started.
    pub since: DateTime<Utc>,
}

/// A pending request with the profile of the other party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendRequestWithUser {
    /// Request identifier.
    pub id: Uuid,
    /// Current status.
    pub status: FriendRequestStatus,
    /// The other party (sender for incoming, recipient for outgoing).
    pub user: User,
    /// When the request was sent.
    pub created_at: DateTime<Utc>,
}

/// One user blocking another. Blocks are one-directional rows, but either
/// direction stops friend requests between the pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Block {
    /// Block identifier.
    pub id: Uuid,
    /// User who placed the block.
    pub blocker_id: Uuid,
    /// User who is blocked.
    pub blocked_id: Uuid,
    /// When the block was placed.
    pub created_at: DateTime<Utc>,
}

/// A block as listed to its owner, with the blocked user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockWithUser {
    /// Block identifier.
    pub id: Uuid,
    /// The blocked user.
    pub user: User,
    /// When the block was placed.
    pub created_at: DateTime<Utc>,
}
