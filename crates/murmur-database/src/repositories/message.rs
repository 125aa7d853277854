//! Message and reaction repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use murmur_core::error::AppError;
use murmur_core::result::AppResult;
use murmur_entity::message::{Message, MessageKind, Reaction};
use murmur_entity::user::User;

use super::{MESSAGE_COLUMNS, USER_COLUMNS, db_error};
use crate::store::MessageStore;

const REACTION_COLUMNS: &str = "id, message_id, user_id, emoji, created_at";

/// PostgreSQL-backed [`MessageStore`].
#[derive(Debug, Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new message repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_sender(&self, message: &mut Message) -> AppResult<()> {
        message.sender = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1"
        ))
        .bind(message.sender_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to load message sender"))?;
        Ok(())
    }

    async fn load_reactions(&self, message: &mut Message) -> AppResult<()> {
        message.reactions = sqlx::query_as::<_, Reaction>(&format!(
            "SELECT {REACTION_COLUMNS} FROM reactions WHERE message_id = $1 ORDER BY created_at"
        ))
        .bind(message.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load reactions"))?;
        Ok(())
    }
}

#[async_trait]
impl MessageStore for PgMessageRepository {
    async fn create_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
        kind: MessageKind,
    ) -> AppResult<Message> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let mut message = sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (id, conversation_id, sender_id, content, kind) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content)
        .bind(kind)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to create message"))?;

        sqlx::query("UPDATE conversations SET updated_at = NOW() WHERE id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to touch conversation"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;

        self.load_sender(&mut message).await?;
        Ok(message)
    }

    async fn list_messages(
        &self,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Message>> {
        let mut page = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(conversation_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load messages"))?;

        page.reverse();
        for message in &mut page {
            self.load_sender(message).await?;
            self.load_reactions(message).await?;
        }
        Ok(page)
    }

    async fn find_message(&self, message_id: Uuid) -> AppResult<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find message"))?;

        match message {
            Some(mut message) => {
                self.load_sender(&mut message).await?;
                self.load_reactions(&mut message).await?;
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }

    async fn delete_message(&self, message_id: Uuid, requester_id: Uuid) -> AppResult<Message> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let row: Option<(Uuid, Option<Uuid>)> = sqlx::query_as(
            "SELECT m.sender_id, c.owner_id FROM messages m \
             JOIN conversations c ON c.id = m.conversation_id \
             WHERE m.id = $1 FOR UPDATE OF m",
        )
        .bind(message_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to load message"))?;

        let (sender_id, owner_id) = row.ok_or_else(|| AppError::not_found("Message not found"))?;
        if sender_id != requester_id && owner_id != Some(requester_id) {
            return Err(AppError::authorization("You can only delete your own messages"));
        }

        let message = sqlx::query_as::<_, Message>(&format!(
            "DELETE FROM messages WHERE id = $1 RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to delete message"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Ok(message)
    }

    async fn add_reaction(&self, message_id: Uuid, user_id: Uuid, emoji: &str) -> AppResult<Reaction> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM messages WHERE id = $1)")
            .bind(message_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to check message"))?;
        if !exists {
            return Err(AppError::not_found("Message not found"));
        }

        sqlx::query_as::<_, Reaction>(&format!(
            "INSERT INTO reactions (id, message_id, user_id, emoji) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (message_id, user_id, emoji) DO UPDATE SET emoji = EXCLUDED.emoji \
             RETURNING {REACTION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(message_id)
        .bind(user_id)
        .bind(emoji)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to add reaction"))
    }

    async fn remove_reaction(&self, message_id: Uuid, user_id: Uuid, emoji: &str) -> AppResult<()> {
        let result = sqlx::query(
            "DELETE FROM reactions WHERE message_id = $1 AND user_id = $2 AND emoji = $3",
        )
        .bind(message_id)
        .bind(user_id)
        .bind(emoji)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to remove reaction"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Reaction not found"));
        }
        Ok(())
    }
}
