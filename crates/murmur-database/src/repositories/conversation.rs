//! Conversation repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use murmur_core::error::AppError;
use murmur_core::result::AppResult;
use murmur_entity::conversation::{Conversation, ConversationKind, ConversationWithDetails};
use murmur_entity::message::Message;
use murmur_entity::user::User;

use super::{MESSAGE_COLUMNS, USER_COLUMNS, db_error};
use crate::store::ConversationStore;

const CONVERSATION_COLUMNS: &str =
    "c.id, c.kind, c.name, c.avatar_url, c.owner_id, c.created_at, c.updated_at";

#[derive(FromRow)]
struct ParticipantRow {
    conversation_id: Uuid,
    #[sqlx(flatten)]
    user: User,
}

/// PostgreSQL-backed [`ConversationStore`].
#[derive(Debug, Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    /// Create a new conversation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach participants and the latest message to each conversation,
    /// preserving input order.
    async fn with_details(
        &self,
        conversations: Vec<Conversation>,
    ) -> AppResult<Vec<ConversationWithDetails>> {
        if conversations.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = conversations.iter().map(|c| c.id).collect();

        let participants = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT cp.conversation_id, {USER_COLUMNS} \
             FROM conversation_participants cp JOIN users u ON u.id = cp.user_id \
             WHERE cp.conversation_id = ANY($1) ORDER BY cp.joined_at"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load conversation participants"))?;

        let last_messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT DISTINCT ON (conversation_id) {MESSAGE_COLUMNS} FROM messages \
             WHERE conversation_id = ANY($1) ORDER BY conversation_id, created_at DESC"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load last messages"))?;

        let mut members: HashMap<Uuid, Vec<User>> = HashMap::new();
        for row in participants {
            members.entry(row.conversation_id).or_default().push(row.user);
        }
        let mut latest: HashMap<Uuid, Message> = last_messages
            .into_iter()
            .map(|m| (m.conversation_id, m))
            .collect();

        Ok(conversations
            .into_iter()
            .map(|c| {
                let users = members.remove(&c.id).unwrap_or_default();
                let last = latest.remove(&c.id);
                ConversationWithDetails::new(c, users, last)
            })
            .collect())
    }

    async fn require_details(&self, conversation_id: Uuid) -> AppResult<ConversationWithDetails> {
        self.find_conversation(conversation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation not found"))
    }

    /// Lock a conversation row and check it is a group.
    async fn lock_group(
        tx: &mut Transaction<'_, Postgres>,
        conversation_id: Uuid,
    ) -> AppResult<Conversation> {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c WHERE c.id = $1 FOR UPDATE"
        ))
        .bind(conversation_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error("Failed to load conversation"))?
        .ok_or_else(|| AppError::not_found("Conversation not found"))?;

        if conversation.kind != ConversationKind::Group {
            return Err(AppError::validation("Operation only applies to group conversations"));
        }
        Ok(conversation)
    }

    async fn member_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM conversation_participants \
             WHERE conversation_id = $1 AND user_id = $2)",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error("Failed to check participant"))
    }
}

#[async_trait]
impl ConversationStore for PgConversationRepository {
    async fn user_conversations(&self, user_id: Uuid) -> AppResult<Vec<ConversationWithDetails>> {
        let conversations = sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c \
             JOIN conversation_participants cp ON cp.conversation_id = c.id \
             WHERE cp.user_id = $1 ORDER BY c.updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load conversations"))?;

        self.with_details(conversations).await
    }

    async fn participant_ids(&self, conversation_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM conversation_participants WHERE conversation_id = $1 \
             ORDER BY joined_at",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load participant ids"))
    }

    async fn is_participant(&self, conversation_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM conversation_participants \
             WHERE conversation_id = $1 AND user_id = $2)",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to check participant"))
    }

    async fn find_conversation(
        &self,
        conversation_id: Uuid,
    ) -> AppResult<Option<ConversationWithDetails>> {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c WHERE c.id = $1"
        ))
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find conversation"))?;

        match conversation {
            Some(c) => Ok(self.with_details(vec![c]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn get_or_create_dm(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> AppResult<(ConversationWithDetails, bool)> {
        if user_a == user_b {
            return Err(AppError::validation("Cannot open a conversation with yourself"));
        }
        let (low, high) = if user_a < user_b { (user_a, user_b) } else { (user_b, user_a) };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        // Serialize concurrent creation of the same pair.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("dm:{low}:{high}"))
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to lock DM pair"))?;

        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT c.id FROM conversations c \
             JOIN conversation_participants p1 ON p1.conversation_id = c.id AND p1.user_id = $1 \
             JOIN conversation_participants p2 ON p2.conversation_id = c.id AND p2.user_id = $2 \
             WHERE c.kind = 'dm' LIMIT 1",
        )
        .bind(low)
        .bind(high)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to look up DM"))?;

        let (conversation_id, created) = match existing {
            Some(id) => (id, false),
            None => {
                let id = Uuid::new_v4();
                sqlx::query("INSERT INTO conversations (id, kind) VALUES ($1, 'dm')")
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error("Failed to create DM"))?;
                sqlx::query(
                    "INSERT INTO conversation_participants (conversation_id, user_id) \
                     VALUES ($1, $2), ($1, $3)",
                )
                .bind(id)
                .bind(user_a)
                .bind(user_b)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to add DM participants"))?;
                (id, true)
            }
        };

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;

        Ok((self.require_details(conversation_id).await?, created))
    }

    async fn create_group(
        &self,
        owner_id: Uuid,
        name: &str,
        members: &[Uuid],
    ) -> AppResult<ConversationWithDetails> {
        let id = Uuid::new_v4();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        sqlx::query("INSERT INTO conversations (id, kind, name, owner_id) VALUES ($1, 'group', $2, $3)")
            .bind(id)
            .bind(name)
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to create group"))?;

        for user_id in std::iter::once(owner_id).chain(members.iter().copied()) {
            sqlx::query(
                "INSERT INTO conversation_participants (conversation_id, user_id) \
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to add group participant"))?;
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;

        self.require_details(id).await
    }

    async fn add_participants(
        &self,
        conversation_id: Uuid,
        requester_id: Uuid,
        user_ids: &[Uuid],
    ) -> AppResult<Vec<Uuid>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        Self::lock_group(&mut tx, conversation_id).await?;
        if !Self::member_in_tx(&mut tx, conversation_id, requester_id).await? {
            return Err(AppError::authorization("Not a participant of this conversation"));
        }

        let mut added = Vec::new();
        for &user_id in user_ids {
            let result = sqlx::query(
                "INSERT INTO conversation_participants (conversation_id, user_id) \
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(conversation_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to add participant"))?;
            if result.rows_affected() == 1 {
                added.push(user_id);
            }
        }

        sqlx::query("UPDATE conversations SET updated_at = NOW() WHERE id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to touch conversation"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Ok(added)
    }

    async fn rename_group(
        &self,
        conversation_id: Uuid,
        requester_id: Uuid,
        name: &str,
    ) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let group = Self::lock_group(&mut tx, conversation_id).await?;
        if group.owner_id.is_some_and(|owner| owner != requester_id) {
            return Err(AppError::authorization("Only the group owner can rename the group"));
        }
        if !Self::member_in_tx(&mut tx, conversation_id, requester_id).await? {
            return Err(AppError::authorization("Not a participant of this conversation"));
        }

        sqlx::query("UPDATE conversations SET name = $1, updated_at = NOW() WHERE id = $2")
            .bind(name)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to rename group"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))
    }

    async fn leave_group(&self, conversation_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        Self::lock_group(&mut tx, conversation_id).await?;
        let result = sqlx::query(
            "DELETE FROM conversation_participants WHERE conversation_id = $1 AND user_id = $2",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to leave group"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::authorization("Not a participant of this conversation"));
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))
    }
}
