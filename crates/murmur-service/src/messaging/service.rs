//! Message and reaction service.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use murmur_core::error::AppError;
use murmur_core::result::AppResult;
use murmur_database::store::{ConversationStore, MessageStore};
use murmur_entity::message::{Message, MessageKind, Reaction};
use murmur_realtime::message::{MessageCreate, MessageDelete, ReactionAdd, ReactionRemove};
use murmur_realtime::{EventPublisher, EventType};

use super::{DEFAULT_MESSAGE_PAGE, MAX_EMOJI_CHARS, MAX_MESSAGE_CHARS, MAX_MESSAGE_PAGE};
use crate::context::RequestContext;
use crate::fanout::ConversationFanout;

/// Posts and deletes messages and reactions, notifying every participant.
#[derive(Clone)]
pub struct MessageService {
    messages: Arc<dyn MessageStore>,
    conversations: Arc<dyn ConversationStore>,
    fanout: ConversationFanout,
}

impl std::fmt::Debug for MessageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageService").finish()
    }
}

impl MessageService {
    /// Creates a new message service.
    pub fn new(
        messages: Arc<dyn MessageStore>,
        conversations: Arc<dyn ConversationStore>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            messages,
            fanout: ConversationFanout::new(conversations.clone(), publisher),
            conversations,
        }
    }

    /// Post a text message.
    pub async fn send_message(
        &self,
        ctx: &RequestContext,
        conversation_id: Uuid,
        content: &str,
    ) -> AppResult<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Message content is required"));
        }
        if content.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::validation(format!(
                "Message content exceeds {MAX_MESSAGE_CHARS} characters"
            )));
        }
        self.require_participant(conversation_id, ctx.user_id)
            .await?;

        let message = self
            .messages
            .create_message(conversation_id, ctx.user_id, content, MessageKind::Text)
            .await?;
        debug!(message_id = %message.id, conversation_id = %conversation_id, "Message sent");

        let event = MessageCreate {
            message: message.clone(),
            conversation_id,
        };
        self.fanout
            .to_participants(conversation_id, EventType::MessageCreate, &event)
            .await;
        Ok(message)
    }

    /// A page of history, oldest first. `offset` counts back from the
    /// newest message. A missing or out-of-range `limit` falls back to
    /// the default page size; a missing or negative `offset` to zero.
    pub async fn list_messages(
        &self,
        ctx: &RequestContext,
        conversation_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> AppResult<Vec<Message>> {
        self.require_participant(conversation_id, ctx.user_id)
            .await?;
        let limit = limit
            .filter(|l| (1..=MAX_MESSAGE_PAGE).contains(l))
            .unwrap_or(DEFAULT_MESSAGE_PAGE);
        let offset = offset.filter(|o| *o >= 0).unwrap_or(0);
        self.messages
            .list_messages(conversation_id, limit, offset)
            .await
    }

    /// Delete a message. Only its sender or the group owner may.
    pub async fn delete_message(&self, ctx: &RequestContext, message_id: Uuid) -> AppResult<()> {
        let message = self.load_visible(ctx, message_id).await?;
        self.messages
            .delete_message(message_id, ctx.user_id)
            .await?;

        let event = MessageDelete {
            message_id,
            conversation_id: message.conversation_id,
        };
        self.fanout
            .to_participants(message.conversation_id, EventType::MessageDelete, &event)
            .await;
        Ok(())
    }

    /// React to a message.
    pub async fn add_reaction(
        &self,
        ctx: &RequestContext,
        message_id: Uuid,
        emoji: &str,
    ) -> AppResult<Reaction> {
        let emoji = validate_emoji(emoji)?;
        let message = self.load_visible(ctx, message_id).await?;
        let reaction = self
            .messages
            .add_reaction(message_id, ctx.user_id, emoji)
            .await?;

        let event = ReactionAdd {
            reaction: reaction.clone(),
            message_id,
            conversation_id: message.conversation_id,
        };
        self.fanout
            .to_participants(message.conversation_id, EventType::ReactionAdd, &event)
            .await;
        Ok(reaction)
    }

    /// Withdraw a reaction.
    pub async fn remove_reaction(
        &self,
        ctx: &RequestContext,
        message_id: Uuid,
        emoji: &str,
    ) -> AppResult<()> {
        let emoji = validate_emoji(emoji)?;
        let message = self.load_visible(ctx, message_id).await?;
        self.messages
            .remove_reaction(message_id, ctx.user_id, emoji)
            .await?;

        let event = ReactionRemove {
            message_id,
            conversation_id: message.conversation_id,
            user_id: ctx.user_id,
            emoji: emoji.to_string(),
        };
        self.fanout
            .to_participants(message.conversation_id, EventType::ReactionRemove, &event)
            .await;
        Ok(())
    }

    /// Load a message the caller is allowed to see.
    async fn load_visible(&self, ctx: &RequestContext, message_id: Uuid) -> AppResult<Message> {
        let message = self
            .messages
            .find_message(message_id)
            .await?
            .ok_or_else(|| AppError::not_found("Message not found"))?;
        self.require_participant(message.conversation_id, ctx.user_id)
            .await?;
        Ok(message)
    }

    async fn require_participant(&self, conversation_id: Uuid, user_id: Uuid) -> AppResult<()> {
        if self
            .conversations
            .is_participant(conversation_id, user_id)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::authorization("Not a participant of this conversation"))
        }
    }
}

fn validate_emoji(emoji: &str) -> AppResult<&str> {
    let emoji = emoji.trim();
    if emoji.is_empty() || emoji.chars().count() > MAX_EMOJI_CHARS {
        return Err(AppError::validation("Invalid reaction"));
    }
    Ok(emoji)
}
