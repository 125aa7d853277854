//! [`MemoryStore`] and its trait implementations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use murmur_core::error::AppError;
use murmur_core::result::AppResult;
use murmur_entity::call::{ActiveCall, Call, CallParticipant};
use murmur_entity::conversation::{Conversation, ConversationKind, ConversationWithDetails};
use murmur_entity::friendship::{
    Block, BlockWithUser, FriendRequest, FriendRequestStatus, FriendRequestWithUser, FriendWithUser,
};
use murmur_entity::message::{Message, MessageKind, Reaction};
use murmur_entity::user::{PresenceStatus, User};

use super::state::MemoryState;
use crate::store::{CallStore, ConversationStore, MessageStore, SocialGraphStore, UserStore};

/// In-memory implementation of every store trait.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user. Stored status is always `offline`.
    pub async fn insert_user(&self, email: &str, username: Option<&str>) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            username: username.map(str::to_string),
            avatar_url: None,
            status: PresenceStatus::Offline,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.users.insert(user.id, user.clone());
        user
    }

    /// Record an accepted friendship between two users.
    pub async fn insert_friendship(&self, a: Uuid, b: Uuid) -> FriendRequest {
        let now = Utc::now();
        let request = FriendRequest {
            id: Uuid::new_v4(),
            from_user_id: a,
            to_user_id: b,
            status: FriendRequestStatus::Accepted,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.requests.push(request.clone());
        request
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }
}

#[async_trait]
impl SocialGraphStore for MemoryStore {
    async fn friend_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let state = self.state.lock().await;
        Ok(state
            .requests
            .iter()
            .filter(|r| r.status == FriendRequestStatus::Accepted && r.involves(user_id))
            .map(|r| r.counterpart(user_id))
            .collect())
    }

    async fn friends(&self, user_id: Uuid) -> AppResult<Vec<FriendWithUser>> {
        Ok(self.state.lock().await.friends_of(user_id))
    }

    async fn incoming_requests(&self, user_id: Uuid) -> AppResult<Vec<FriendRequestWithUser>> {
        let state = self.state.lock().await;
        Ok(state
            .requests
            .iter()
            .rev()
            .filter(|r| r.status == FriendRequestStatus::Pending && r.to_user_id == user_id)
            .filter_map(|r| state.request_view(r, user_id))
            .collect())
    }

    async fn outgoing_requests(&self, user_id: Uuid) -> AppResult<Vec<FriendRequestWithUser>> {
        let state = self.state.lock().await;
        Ok(state
            .requests
            .iter()
            .rev()
            .filter(|r| r.status == FriendRequestStatus::Pending && r.from_user_id == user_id)
            .filter_map(|r| state.request_view(r, user_id))
            .collect())
    }

    async fn find_request(&self, request_id: Uuid) -> AppResult<Option<FriendRequest>> {
        let state = self.state.lock().await;
        Ok(state.requests.iter().find(|r| r.id == request_id).cloned())
    }

    async fn request_with_user(
        &self,
        request_id: Uuid,
        viewer_id: Uuid,
    ) -> AppResult<Option<FriendRequestWithUser>> {
        let state = self.state.lock().await;
        Ok(state
            .requests
            .iter()
            .find(|r| r.id == request_id)
            .and_then(|r| state.request_view(r, viewer_id)))
    }

    async fn find_friend(&self, user_id: Uuid, friend_id: Uuid) -> AppResult<Option<FriendWithUser>> {
        let state = self.state.lock().await;
        Ok(state
            .friends_of(user_id)
            .into_iter()
            .find(|f| f.user.id == friend_id))
    }

    async fn send_request(&self, from: Uuid, to: Uuid) -> AppResult<FriendRequest> {
        if from == to {
            return Err(AppError::validation("Cannot send a friend request to yourself"));
        }
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&to) {
            return Err(AppError::not_found("User not found"));
        }
        if state.blocked_between(from, to) {
            return Err(AppError::authorization("Cannot send request to this user"));
        }
        if state.accepted_between(from, to).is_some() {
            return Err(AppError::conflict("Already friends"));
        }

        let now = Utc::now();
        if let Some(pending) = state.requests.iter_mut().find(|r| {
            r.status == FriendRequestStatus::Pending && r.involves(from) && r.involves(to)
        }) {
            if pending.from_user_id == from {
                return Err(AppError::conflict("Friend request already sent"));
            }
            pending.status = FriendRequestStatus::Accepted;
            pending.updated_at = now;
            return Ok(pending.clone());
        }

        state
            .requests
            .retain(|r| !(r.status == FriendRequestStatus::Declined && r.involves(from) && r.involves(to)));
        let request = FriendRequest {
            id: Uuid::new_v4(),
            from_user_id: from,
            to_user_id: to,
            status: FriendRequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.requests.push(request.clone());
        Ok(request)
    }

    async fn accept_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<FriendRequest> {
        let mut state = self.state.lock().await;
        let request = state
            .requests
            .iter_mut()
            .find(|r| r.id == request_id && r.to_user_id == user_id && r.status == FriendRequestStatus::Pending)
            .ok_or_else(|| AppError::not_found("Friend request not found"))?;
        request.status = FriendRequestStatus::Accepted;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn decline_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<FriendRequest> {
        let mut state = self.state.lock().await;
        let request = state
            .requests
            .iter_mut()
            .find(|r| r.id == request_id && r.to_user_id == user_id && r.status == FriendRequestStatus::Pending)
            .ok_or_else(|| AppError::not_found("Friend request not found"))?;
        request.status = FriendRequestStatus::Declined;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn cancel_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<FriendRequest> {
        let mut state = self.state.lock().await;
        let index = state
            .requests
            .iter()
            .position(|r| r.id == request_id && r.from_user_id == user_id && r.status == FriendRequestStatus::Pending)
            .ok_or_else(|| AppError::not_found("Friend request not found"))?;
        Ok(state.requests.remove(index))
    }

    async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let before = state.requests.len();
        state.requests.retain(|r| {
            !(r.status == FriendRequestStatus::Accepted && r.involves(user_id) && r.involves(friend_id))
        });
        if state.requests.len() == before {
            return Err(AppError::not_found("Friendship not found"));
        }
        Ok(())
    }

    async fn block_user(
        &self,
        blocker_id: Uuid,
        blocked_id: Uuid,
    ) -> AppResult<(Block, Vec<FriendRequest>)> {
        if blocker_id == blocked_id {
            return Err(AppError::validation("Cannot block yourself"));
        }
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&blocked_id) {
            return Err(AppError::not_found("User not found"));
        }

        let (removed, kept): (Vec<FriendRequest>, Vec<FriendRequest>) =
            std::mem::take(&mut state.requests)
                .into_iter()
                .partition(|r| r.involves(blocker_id) && r.involves(blocked_id));
        state.requests = kept;

        let existing = state
            .blocks
            .iter()
            .find(|b| b.blocker_id == blocker_id && b.blocked_id == blocked_id)
            .cloned();
        let block = match existing {
            Some(block) => block,
            None => {
                let block = Block {
                    id: Uuid::new_v4(),
                    blocker_id,
                    blocked_id,
                    created_at: Utc::now(),
                };
                state.blocks.push(block.clone());
                block
            }
        };
        Ok((block, removed))
    }

    async fn unblock_user(&self, blocker_id: Uuid, blocked_id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let before = state.blocks.len();
        state
            .blocks
            .retain(|b| !(b.blocker_id == blocker_id && b.blocked_id == blocked_id));
        if state.blocks.len() == before {
            return Err(AppError::not_found("Block not found"));
        }
        Ok(())
    }

    async fn blocked_users(&self, blocker_id: Uuid) -> AppResult<Vec<BlockWithUser>> {
        let state = self.state.lock().await;
        Ok(state
            .blocks
            .iter()
            .rev()
            .filter(|b| b.blocker_id == blocker_id)
            .filter_map(|b| {
                let user = state.users.get(&b.blocked_id)?.clone();
                Some(BlockWithUser {
                    id: b.id,
                    user,
                    created_at: b.created_at,
                })
            })
            .collect())
    }

    async fn is_blocked(&self, a: Uuid, b: Uuid) -> AppResult<bool> {
        Ok(self.state.lock().await.blocked_between(a, b))
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn user_conversations(&self, user_id: Uuid) -> AppResult<Vec<ConversationWithDetails>> {
        let state = self.state.lock().await;
        let mut conversations: Vec<ConversationWithDetails> = state
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| state.details(m.conversation_id))
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    async fn participant_ids(&self, conversation_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self.state.lock().await.member_ids(conversation_id))
    }

    async fn is_participant(&self, conversation_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self.state.lock().await.is_member(conversation_id, user_id))
    }

    async fn find_conversation(
        &self,
        conversation_id: Uuid,
    ) -> AppResult<Option<ConversationWithDetails>> {
        Ok(self.state.lock().await.details(conversation_id))
    }

    async fn get_or_create_dm(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> AppResult<(ConversationWithDetails, bool)> {
        if user_a == user_b {
            return Err(AppError::validation("Cannot open a conversation with yourself"));
        }
        let mut state = self.state.lock().await;
        let existing = state
            .conversations
            .values()
            .find(|c| {
                c.kind == ConversationKind::Dm
                    && state.is_member(c.id, user_a)
                    && state.is_member(c.id, user_b)
            })
            .map(|c| c.id);

        let (id, created) = match existing {
            Some(id) => (id, false),
            None => {
                let now = Utc::now();
                let conversation = Conversation {
                    id: Uuid::new_v4(),
                    kind: ConversationKind::Dm,
                    name: None,
                    avatar_url: None,
                    owner_id: None,
                    created_at: now,
                    updated_at: now,
                };
                let id = conversation.id;
                state.conversations.insert(id, conversation);
                state.add_member(id, user_a);
                state.add_member(id, user_b);
                (id, true)
            }
        };

        let details = state
            .details(id)
            .ok_or_else(|| AppError::internal("Conversation vanished"))?;
        Ok((details, created))
    }

    async fn create_group(
        &self,
        owner_id: Uuid,
        name: &str,
        members: &[Uuid],
    ) -> AppResult<ConversationWithDetails> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            kind: ConversationKind::Group,
            name: Some(name.to_string()),
            avatar_url: None,
            owner_id: Some(owner_id),
            created_at: now,
            updated_at: now,
        };
        let id = conversation.id;
        state.conversations.insert(id, conversation);
        for user_id in std::iter::once(owner_id).chain(members.iter().copied()) {
            state.add_member(id, user_id);
        }
        state
            .details(id)
            .ok_or_else(|| AppError::internal("Conversation vanished"))
    }

    async fn add_participants(
        &self,
        conversation_id: Uuid,
        requester_id: Uuid,
        user_ids: &[Uuid],
    ) -> AppResult<Vec<Uuid>> {
        let mut state = self.state.lock().await;
        require_group(&state, conversation_id)?;
        if !state.is_member(conversation_id, requester_id) {
            return Err(AppError::authorization("Not a participant of this conversation"));
        }
        let added: Vec<Uuid> = user_ids
            .iter()
            .copied()
            .filter(|&id| state.add_member(conversation_id, id))
            .collect();
        state.touch_conversation(conversation_id, Utc::now());
        Ok(added)
    }

    async fn rename_group(
        &self,
        conversation_id: Uuid,
        requester_id: Uuid,
        name: &str,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let group = require_group(&state, conversation_id)?;
        if group.owner_id.is_some_and(|owner| owner != requester_id) {
            return Err(AppError::authorization("Only the group owner can rename the group"));
        }
        if !state.is_member(conversation_id, requester_id) {
            return Err(AppError::authorization("Not a participant of this conversation"));
        }
        if let Some(c) = state.conversations.get_mut(&conversation_id) {
            c.name = Some(name.to_string());
            c.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn leave_group(&self, conversation_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;
        require_group(&state, conversation_id)?;
        let before = state.memberships.len();
        state
            .memberships
            .retain(|m| !(m.conversation_id == conversation_id && m.user_id == user_id));
        if state.memberships.len() == before {
            return Err(AppError::authorization("Not a participant of this conversation"));
        }
        Ok(())
    }
}

fn require_group(state: &MemoryState, conversation_id: Uuid) -> AppResult<Conversation> {
    let conversation = state
        .conversations
        .get(&conversation_id)
        .cloned()
        .ok_or_else(|| AppError::not_found("Conversation not found"))?;
    if conversation.kind != ConversationKind::Group {
        return Err(AppError::validation("Operation only applies to group conversations"));
    }
    Ok(conversation)
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
        kind: MessageKind,
    ) -> AppResult<Message> {
        let mut state = self.state.lock().await;
        if !state.conversations.contains_key(&conversation_id) {
            return Err(AppError::not_found("Conversation not found"));
        }
        let now = Utc::now();
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            content: content.to_string(),
            kind,
            created_at: now,
            updated_at: now,
            sender: None,
            reactions: Vec::new(),
        };
        state.messages.push(message.clone());
        state.touch_conversation(conversation_id, now);
        Ok(state.with_sender(message))
    }

    async fn list_messages(
        &self,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Message>> {
        let state = self.state.lock().await;
        let mut page: Vec<Message> = state
            .messages
            .iter()
            .rev()
            .filter(|m| m.conversation_id == conversation_id)
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|m| state.with_reactions(state.with_sender(m.clone())))
            .collect();
        page.reverse();
        Ok(page)
    }

    async fn find_message(&self, message_id: Uuid) -> AppResult<Option<Message>> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .map(|m| state.with_reactions(state.with_sender(m.clone()))))
    }

    async fn delete_message(&self, message_id: Uuid, requester_id: Uuid) -> AppResult<Message> {
        let mut state = self.state.lock().await;
        let index = state
            .messages
            .iter()
            .position(|m| m.id == message_id)
            .ok_or_else(|| AppError::not_found("Message not found"))?;
        let message = &state.messages[index];
        let owner = state
            .conversations
            .get(&message.conversation_id)
            .and_then(|c| c.owner_id);
        if message.sender_id != requester_id && owner != Some(requester_id) {
            return Err(AppError::authorization("You can only delete your own messages"));
        }
        state.reactions.retain(|r| r.message_id != message_id);
        Ok(state.messages.remove(index))
    }

    async fn add_reaction(&self, message_id: Uuid, user_id: Uuid, emoji: &str) -> AppResult<Reaction> {
        let mut state = self.state.lock().await;
        if !state.messages.iter().any(|m| m.id == message_id) {
            return Err(AppError::not_found("Message not found"));
        }
        if let Some(existing) = state
            .reactions
            .iter()
            .find(|r| r.message_id == message_id && r.user_id == user_id && r.emoji == emoji)
        {
            return Ok(existing.clone());
        }
        let reaction = Reaction {
            id: Uuid::new_v4(),
            message_id,
            user_id,
            emoji: emoji.to_string(),
            created_at: Utc::now(),
        };
        state.reactions.push(reaction.clone());
        Ok(reaction)
    }

    async fn remove_reaction(&self, message_id: Uuid, user_id: Uuid, emoji: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let before = state.reactions.len();
        state
            .reactions
            .retain(|r| !(r.message_id == message_id && r.user_id == user_id && r.emoji == emoji));
        if state.reactions.len() == before {
            return Err(AppError::not_found("Reaction not found"));
        }
        Ok(())
    }
}

#[async_trait]
impl CallStore for MemoryStore {
    async fn find_call(&self, call_id: Uuid) -> AppResult<Option<Call>> {
        Ok(self.state.lock().await.calls.get(&call_id).cloned())
    }

    async fn find_active_for_conversation(&self, conversation_id: Uuid) -> AppResult<Option<Call>> {
        Ok(self.state.lock().await.active_call_for(conversation_id).cloned())
    }

    async fn find_active_for_user(&self, user_id: Uuid) -> AppResult<Option<Call>> {
        let state = self.state.lock().await;
        Ok(state
            .call_members
            .iter()
            .filter(|p| p.user_id == user_id && p.is_active())
            .filter_map(|p| state.calls.get(&p.call_id))
            .find(|c| c.is_active())
            .cloned())
    }

    async fn active_participants(&self, call_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self.state.lock().await.live_members(call_id))
    }

    async fn active_calls_for_conversations(
        &self,
        conversation_ids: &[Uuid],
    ) -> AppResult<Vec<ActiveCall>> {
        let state = self.state.lock().await;
        Ok(conversation_ids
            .iter()
            .filter_map(|&id| state.active_call_for(id))
            .map(|call| ActiveCall {
                call: call.clone(),
                participants: state.live_members(call.id),
            })
            .collect())
    }

    async fn start_or_get_active(
        &self,
        conversation_id: Uuid,
        starter_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<(Call, bool)> {
        let mut state = self.state.lock().await;
        if let Some(call) = state.active_call_for(conversation_id) {
            return Ok((call.clone(), false));
        }
        let call = Call {
            id: Uuid::new_v4(),
            conversation_id,
            started_by: starter_id,
            started_at: now,
            ended_at: None,
        };
        state.calls.insert(call.id, call.clone());
        state.call_members.push(CallParticipant {
            call_id: call.id,
            user_id: starter_id,
            joined_at: now,
            left_at: None,
        });
        Ok((call, true))
    }

    async fn add_participant(&self, call_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let call = state
            .calls
            .get(&call_id)
            .ok_or_else(|| AppError::not_found("Call not found"))?;
        if !call.is_active() {
            return Err(AppError::gone("Call has ended"));
        }
        if state.live_members(call_id).contains(&user_id) {
            return Ok(false);
        }
        state.call_members.push(CallParticipant {
            call_id,
            user_id,
            joined_at: now,
            left_at: None,
        });
        Ok(true)
    }

    async fn mark_left(&self, call_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let mut closed = false;
        for p in state
            .call_members
            .iter_mut()
            .filter(|p| p.call_id == call_id && p.user_id == user_id && p.is_active())
        {
            p.left_at = Some(now);
            closed = true;
        }
        Ok(closed)
    }

    async fn count_active_participants(&self, call_id: Uuid) -> AppResult<i64> {
        Ok(self.state.lock().await.live_members(call_id).len() as i64)
    }

    async fn try_end(&self, call_id: Uuid, now: DateTime<Utc>, force: bool) -> AppResult<Option<Call>> {
        let mut state = self.state.lock().await;
        let call = state
            .calls
            .get(&call_id)
            .ok_or_else(|| AppError::not_found("Call not found"))?;
        if !call.is_active() {
            return Ok(None);
        }
        if !force && !state.live_members(call_id).is_empty() {
            return Ok(None);
        }
        for p in state
            .call_members
            .iter_mut()
            .filter(|p| p.call_id == call_id && p.is_active())
        {
            p.left_at = Some(now);
        }
        let Some(call) = state.calls.get_mut(&call_id) else {
            return Ok(None);
        };
        call.ended_at = Some(now);
        Ok(Some(call.clone()))
    }

    async fn participant_history(&self, call_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self.state.lock().await.history(call_id))
    }
}
