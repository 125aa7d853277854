//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Start or join the call of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartCallRequest {
    /// Conversation whose call to enter.
    pub conversation_id: Uuid,
}

/// Body of join, leave, and end.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CallIdRequest {
    /// Target call.
    pub call_id: Uuid,
}

/// Send a friend request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FriendRequestBody {
    /// Target user.
    pub user_id: Uuid,
}

/// Send a friend request addressed by username.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UsernameRequestBody {
    /// Target username.
    #[validate(length(min = 1, max = 32, message = "Username must be 1-32 characters"))]
    pub username: String,
}

/// Block a user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BlockRequest {
    /// User to block.
    pub user_id: Uuid,
}

/// Paging for message history.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePageQuery {
    /// Page size, 1 to 100; defaults to 50.
    pub limit: Option<i64>,
    /// Messages to skip, counted back from the newest.
    pub offset: Option<i64>,
}

/// Open a DM.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDmRequest {
    /// The other user.
    pub user_id: Uuid,
}

/// Create a group.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateGroupRequest {
    /// Group name; a default is used when absent.
    #[validate(length(max = 100, message = "Group name is too long"))]
    pub name: Option<String>,
    /// Initial members besides the caller.
    #[validate(length(min = 1, message = "At least one member is required"))]
    pub member_ids: Vec<Uuid>,
}

/// Add members to a group.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddParticipantsRequest {
    /// Users to add.
    #[validate(length(min = 1, message = "At least one user is required"))]
    pub user_ids: Vec<Uuid>,
}

/// Rename a group.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameGroupRequest {
    /// New name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// Post a message.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    /// Message text.
    #[validate(length(min = 1, max = 4000, message = "Message must be 1-4000 characters"))]
    pub content: String,
}

/// React to a message.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReactionRequest {
    /// The emoji.
    #[validate(length(min = 1, max = 32))]
    pub emoji: String,
}
