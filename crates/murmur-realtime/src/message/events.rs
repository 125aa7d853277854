//! Payloads carried in the `data` field of each event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use murmur_entity::call::ActiveCall;
use murmur_entity::conversation::ConversationWithDetails;
use murmur_entity::friendship::{FriendRequestWithUser, FriendWithUser};
use murmur_entity::message::{Message, Reaction};
use murmur_entity::user::{PresenceStatus, User};

/// `READY`: everything a client needs to render after connecting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyState {
    /// The subscriber's own profile.
    pub user: User,
    /// Accepted friends, with live status.
    pub friends: Vec<FriendWithUser>,
    /// Pending requests addressed to the subscriber.
    pub incoming_requests: Vec<FriendRequestWithUser>,
    /// Pending requests sent by the subscriber.
    pub outgoing_requests: Vec<FriendRequestWithUser>,
    /// Conversations, with live participant status.
    pub conversations: Vec<ConversationWithDetails>,
    /// Active calls in those conversations.
    pub active_calls: Vec<ActiveCallInfo>,
}

/// Summary of an active call inside `READY`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveCallInfo {
    /// Call id.
    pub call_id: Uuid,
    /// Owning conversation.
    pub conversation_id: Uuid,
    /// Live participant ids.
    pub participants: Vec<Uuid>,
    /// Start time.
    pub started_at: DateTime<Utc>,
}

impl From<ActiveCall> for ActiveCallInfo {
    fn from(active: ActiveCall) -> Self {
        Self {
            call_id: active.call.id,
            conversation_id: active.call.conversation_id,
            participants: active.participants,
            started_at: active.call.started_at,
        }
    }
}

/// `PRESENCE_UPDATE`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceUpdate {
    /// The user whose presence changed.
    pub user_id: Uuid,
    /// New status.
    pub status: PresenceStatus,
}

/// `FRIEND_REQUEST_CREATE`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendRequestCreate {
    /// The request, with the sender's profile.
    pub request: FriendRequestWithUser,
}

/// `FRIEND_REQUEST_DELETE`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendRequestDelete {
    /// The removed request.
    pub request_id: Uuid,
    /// The other user involved.
    pub user_id: Uuid,
}

/// `RELATIONSHIP_ADD`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipAdd {
    /// The new friend, from the recipient's side.
    pub friend: FriendWithUser,
}

/// `RELATIONSHIP_REMOVE`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRemove {
    /// The former friend.
    pub user_id: Uuid,
}

/// `MESSAGE_CREATE`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageCreate {
    /// The new message.
    pub message: Message,
    /// Owning conversation.
    pub conversation_id: Uuid,
}

/// `MESSAGE_DELETE`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDelete {
    /// The deleted message.
    pub message_id: Uuid,
    /// Owning conversation.
    pub conversation_id: Uuid,
}

/// `REACTION_ADD`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionAdd {
    /// The reaction.
    pub reaction: Reaction,
    /// The message reacted to.
    pub message_id: Uuid,
    /// Owning conversation.
    pub conversation_id: Uuid,
}

/// `REACTION_REMOVE`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRemove {
    /// The message.
    pub message_id: Uuid,
    /// Owning conversation.
    pub conversation_id: Uuid,
    /// Who removed their reaction.
    pub user_id: Uuid,
    /// The emoji removed.
    pub emoji: String,
}

/// `CALL_STATE`: idempotent snapshot of a conversation's call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallState {
    /// The conversation.
    pub conversation_id: Uuid,
    /// Active call, or `null` when there is none.
    pub call_id: Option<Uuid>,
    /// Users currently in the call.
    pub participants: Vec<Uuid>,
}

impl CallState {
    /// Snapshot for a conversation with no active call.
    pub fn idle(conversation_id: Uuid) -> Self {
        Self {
            conversation_id,
            call_id: None,
            participants: Vec::new(),
        }
    }
}
