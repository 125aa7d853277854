//! Plain data held by [`super::MemoryStore`].

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use murmur_entity::call::{Call, CallParticipant};
use murmur_entity::conversation::{Conversation, ConversationWithDetails};
use murmur_entity::friendship::{
    Block, FriendRequest, FriendRequestStatus, FriendRequestWithUser, FriendWithUser,
};
use murmur_entity::message::{Message, Reaction};
use murmur_entity::user::User;

#[derive(Debug, Clone)]
pub(crate) struct Membership {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryState {
    pub users: HashMap<Uuid, User>,
    pub requests: Vec<FriendRequest>,
    pub blocks: Vec<Block>,
    pub conversations: HashMap<Uuid, Conversation>,
    pub memberships: Vec<Membership>,
    pub messages: Vec<Message>,
    pub reactions: Vec<Reaction>,
    pub calls: HashMap<Uuid, Call>,
    pub call_members: Vec<CallParticipant>,
}

impl MemoryState {
    pub fn accepted_between(&self, a: Uuid, b: Uuid) -> Option<&FriendRequest> {
        self.requests.iter().find(|r| {
            r.status == FriendRequestStatus::Accepted && r.involves(a) && r.involves(b)
        })
    }

    pub fn blocked_between(&self, a: Uuid, b: Uuid) -> bool {
        self.blocks.iter().any(|bl| {
            (bl.blocker_id == a && bl.blocked_id == b) || (bl.blocker_id == b && bl.blocked_id == a)
        })
    }

    pub fn friends_of(&self, user_id: Uuid) -> Vec<FriendWithUser> {
        let mut friends: Vec<FriendWithUser> = self
            .requests
            .iter()
            .filter(|r| r.status == FriendRequestStatus::Accepted && r.involves(user_id))
            .filter_map(|r| {
                let user = self.users.get(&r.counterpart(user_id))?.clone();
                Some(FriendWithUser {
                    friendship_id: r.id,
                    user,
                    since: r.updated_at,
                })
            })
            .collect();
        friends.sort_by(|a, b| a.user.display_name().cmp(b.user.display_name()));
        friends
    }

    pub fn request_view(&self, request: &FriendRequest, viewer_id: Uuid) -> Option<FriendRequestWithUser> {
        let user = self.users.get(&request.counterpart(viewer_id))?.clone();
        Some(FriendRequestWithUser {
            id: request.id,
            status: request.status,
            user,
            created_at: request.created_at,
        })
    }

    pub fn is_member(&self, conversation_id: Uuid, user_id: Uuid) -> bool {
        self.memberships
            .iter()
            .any(|m| m.conversation_id == conversation_id && m.user_id == user_id)
    }

    pub fn member_ids(&self, conversation_id: Uuid) -> Vec<Uuid> {
        self.memberships
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .map(|m| m.user_id)
            .collect()
    }

    pub fn add_member(&mut self, conversation_id: Uuid, user_id: Uuid) -> bool {
        if self.is_member(conversation_id, user_id) {
            return false;
        }
        self.memberships.push(Membership {
            conversation_id,
            user_id,
        });
        true
    }

    pub fn touch_conversation(&mut self, conversation_id: Uuid, now: DateTime<Utc>) {
        if let Some(c) = self.conversations.get_mut(&conversation_id) {
            c.updated_at = now;
        }
    }

    pub fn details(&self, conversation_id: Uuid) -> Option<ConversationWithDetails> {
        let conversation = self.conversations.get(&conversation_id)?.clone();
        let participants = self
            .member_ids(conversation_id)
            .into_iter()
            .filter_map(|id| self.users.get(&id).cloned())
            .collect();
        let last_message = self
            .messages
            .iter()
            .rev()
            .find(|m| m.conversation_id == conversation_id)
            .cloned();
        Some(ConversationWithDetails::new(conversation, participants, last_message))
    }

    pub fn with_sender(&self, mut message: Message) -> Message {
        message.sender = self.users.get(&message.sender_id).cloned();
        message
    }

    pub fn with_reactions(&self, mut message: Message) -> Message {
        message.reactions = self
            .reactions
            .iter()
            .filter(|r| r.message_id == message.id)
            .cloned()
            .collect();
        message
    }

    pub fn live_members(&self, call_id: Uuid) -> Vec<Uuid> {
        self.call_members
            .iter()
            .filter(|p| p.call_id == call_id && p.is_active())
            .map(|p| p.user_id)
            .collect()
    }

    pub fn active_call_for(&self, conversation_id: Uuid) -> Option<&Call> {
        self.calls
            .values()
            .find(|c| c.conversation_id == conversation_id && c.is_active())
    }

    pub fn history(&self, call_id: Uuid) -> Vec<Uuid> {
        let mut seen = HashSet::new();
        self.call_members
            .iter()
            .filter(|p| p.call_id == call_id)
            .filter(|p| seen.insert(p.user_id))
            .map(|p| p.user_id)
            .collect()
    }
}
