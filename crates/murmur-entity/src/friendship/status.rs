//! Friend request status enumeration.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "friend_request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    /// Awaiting a response from the recipient.
    Pending,
    /// Accepted; the two users are friends.
    Accepted,
    /// Declined by the recipient.
    Declined,
}

impl FriendRequestStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}
