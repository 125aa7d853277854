//! Conversation service: DMs and group membership.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use murmur_core::error::AppError;
use murmur_core::result::AppResult;
use murmur_database::store::{ConversationStore, UserStore};
use murmur_entity::conversation::ConversationWithDetails;
use murmur_realtime::{EventPublisher, EventType};

use super::MAX_GROUP_NAME_CHARS;
use crate::context::RequestContext;

const DEFAULT_GROUP_NAME: &str = "Group Chat";

/// Opens DMs and manages groups, notifying members of membership changes.
#[derive(Clone)]
pub struct ConversationService {
    conversations: Arc<dyn ConversationStore>,
    users: Arc<dyn UserStore>,
    publisher: EventPublisher,
}

impl std::fmt::Debug for ConversationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationService").finish()
    }
}

impl ConversationService {
    /// Creates a new conversation service.
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        users: Arc<dyn UserStore>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            conversations,
            users,
            publisher,
        }
    }

    /// Every conversation the caller belongs to, most recent first.
    pub async fn list_conversations(&self, ctx: &RequestContext) -> AppResult<Vec<ConversationWithDetails>> {
        self.conversations.user_conversations(ctx.user_id).await
    }

    /// One conversation with its participants and latest message.
    pub async fn get_conversation(
        &self,
        ctx: &RequestContext,
        conversation_id: Uuid,
    ) -> AppResult<ConversationWithDetails> {
        if !self
            .conversations
            .is_participant(conversation_id, ctx.user_id)
            .await?
        {
            return Err(AppError::authorization("Not a participant of this conversation"));
        }
        self.load(conversation_id).await
    }

    /// Open (or reopen) the DM with another user.
    pub async fn get_or_create_dm(
        &self,
        ctx: &RequestContext,
        other_user_id: Uuid,
    ) -> AppResult<ConversationWithDetails> {
        if other_user_id == ctx.user_id {
            return Err(AppError::validation("Cannot open a conversation with yourself"));
        }
        self.require_user(other_user_id).await?;
        let (conversation, created) = self
            .conversations
            .get_or_create_dm(ctx.user_id, other_user_id)
            .await?;
        if created {
            info!(conversation_id = %conversation.id, "DM created");
        }
        Ok(conversation)
    }

    /// Create a group owned by the caller. Every member receives
    /// `CONVERSATION_CREATE`.
    pub async fn create_group(
        &self,
        ctx: &RequestContext,
        name: Option<&str>,
        member_ids: &[Uuid],
    ) -> AppResult<ConversationWithDetails> {
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => validate_name(name)?,
            _ => DEFAULT_GROUP_NAME,
        };
        let mut members: Vec<Uuid> = Vec::with_capacity(member_ids.len());
        for id in member_ids {
            if *id != ctx.user_id && !members.contains(id) {
                self.require_user(*id).await?;
                members.push(*id);
            }
        }

        let conversation = self
            .conversations
            .create_group(ctx.user_id, name, &members)
            .await?;
        info!(conversation_id = %conversation.id, owner = %ctx.user_id, members = members.len(), "Group created");

        self.publisher
            .publish_to_users(
                &conversation.participant_ids(),
                EventType::ConversationCreate,
                &conversation,
            )
            .await;
        Ok(conversation)
    }

    /// Add members to a group. Existing members receive
    /// `CONVERSATION_UPDATE`; new members additionally receive
    /// `CONVERSATION_CREATE`.
    pub async fn add_participants(
        &self,
        ctx: &RequestContext,
        conversation_id: Uuid,
        user_ids: &[Uuid],
    ) -> AppResult<ConversationWithDetails> {
        if user_ids.is_empty() {
            return Err(AppError::validation("At least one user is required"));
        }
        for id in user_ids {
            self.require_user(*id).await?;
        }

        let added = self
            .conversations
            .add_participants(conversation_id, ctx.user_id, user_ids)
            .await?;
        let conversation = self.load(conversation_id).await?;
        info!(conversation_id = %conversation_id, added = added.len(), "Participants added");

        self.publisher
            .publish_to_users(
                &conversation.participant_ids(),
                EventType::ConversationUpdate,
                &conversation,
            )
            .await;
        self.publisher
            .publish_to_users(&added, EventType::ConversationCreate, &conversation)
            .await;
        Ok(conversation)
    }

    /// Rename a group.
    pub async fn rename_group(
        &self,
        ctx: &RequestContext,
        conversation_id: Uuid,
        name: &str,
    ) -> AppResult<ConversationWithDetails> {
        let name = validate_name(name.trim())?;
        self.conversations
            .rename_group(conversation_id, ctx.user_id, name)
            .await?;
        let conversation = self.load(conversation_id).await?;

        self.publisher
            .publish_to_users(
                &conversation.participant_ids(),
                EventType::ConversationUpdate,
                &conversation,
            )
            .await;
        Ok(conversation)
    }

    /// Leave a group. The remaining members receive `CONVERSATION_UPDATE`.
    pub async fn leave_group(&self, ctx: &RequestContext, conversation_id: Uuid) -> AppResult<()> {
        self.conversations
            .leave_group(conversation_id, ctx.user_id)
            .await?;
        info!(conversation_id = %conversation_id, user_id = %ctx.user_id, "Left group");

        match self.conversations.find_conversation(conversation_id).await {
            Ok(Some(conversation)) => {
                self.publisher
                    .publish_to_users(
                        &conversation.participant_ids(),
                        EventType::ConversationUpdate,
                        &conversation,
                    )
                    .await;
            }
            Ok(None) => {}
            Err(e) => warn!(conversation_id = %conversation_id, error = %e, "Failed to load group after leave"),
        }
        Ok(())
    }

    async fn load(&self, conversation_id: Uuid) -> AppResult<ConversationWithDetails> {
        self.conversations
            .find_conversation(conversation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation not found"))
    }

    async fn require_user(&self, user_id: Uuid) -> AppResult<()> {
        match self.users.find_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(format!("User {user_id} not found"))),
        }
    }
}

fn validate_name(name: &str) -> AppResult<&str> {
    if name.is_empty() || name.chars().count() > MAX_GROUP_NAME_CHARS {
        return Err(AppError::validation(format!(
            "Group name must be 1 to {MAX_GROUP_NAME_CHARS} characters"
        )));
    }
    Ok(name)
}
