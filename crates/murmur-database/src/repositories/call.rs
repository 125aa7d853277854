//! Call session repository implementation.
//!
//! Every mutating method runs in its own transaction and locks the call
//! row with `FOR UPDATE`, so join and end serialize per call. The partial
//! unique indexes on `calls` and `call_participants` back up the
//! one-active-call and one-live-membership invariants.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use murmur_core::error::AppError;
use murmur_core::result::AppResult;
use murmur_entity::call::{ActiveCall, Call};

use super::db_error;
use crate::store::CallStore;

const CALL_COLUMNS: &str = "id, conversation_id, started_by, started_at, ended_at";

#[derive(FromRow)]
struct LiveMember {
    call_id: Uuid,
    user_id: Uuid,
}

/// PostgreSQL-backed [`CallStore`].
#[derive(Debug, Clone)]
pub struct PgCallRepository {
    pool: PgPool,
}

impl PgCallRepository {
    /// Create a new call repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))
    }

    async fn lock_call(tx: &mut Transaction<'_, Postgres>, call_id: Uuid) -> AppResult<Option<Call>> {
        sqlx::query_as::<_, Call>(&format!(
            "SELECT {CALL_COLUMNS} FROM calls WHERE id = $1 FOR UPDATE"
        ))
        .bind(call_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error("Failed to lock call"))
    }
}

#[async_trait]
impl CallStore for PgCallRepository {
    async fn find_call(&self, call_id: Uuid) -> AppResult<Option<Call>> {
        sqlx::query_as::<_, Call>(&format!("SELECT {CALL_COLUMNS} FROM calls WHERE id = $1"))
            .bind(call_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find call"))
    }

    async fn find_active_for_conversation(&self, conversation_id: Uuid) -> AppResult<Option<Call>> {
        sqlx::query_as::<_, Call>(&format!(
            "SELECT {CALL_COLUMNS} FROM calls WHERE conversation_id = $1 AND ended_at IS NULL"
        ))
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find active call"))
    }

    async fn find_active_for_user(&self, user_id: Uuid) -> AppResult<Option<Call>> {
        sqlx::query_as::<_, Call>(
            "SELECT c.id, c.conversation_id, c.started_by, c.started_at, c.ended_at \
             FROM calls c JOIN call_participants cp ON cp.call_id = c.id \
             WHERE cp.user_id = $1 AND cp.left_at IS NULL AND c.ended_at IS NULL \
             LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find user's active call"))
    }

    async fn active_participants(&self, call_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM call_participants WHERE call_id = $1 AND left_at IS NULL \
             ORDER BY joined_at",
        )
        .bind(call_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load call participants"))
    }

    async fn active_calls_for_conversations(
        &self,
        conversation_ids: &[Uuid],
    ) -> AppResult<Vec<ActiveCall>> {
        if conversation_ids.is_empty() {
            return Ok(Vec::new());
        }

        let calls = sqlx::query_as::<_, Call>(&format!(
            "SELECT {CALL_COLUMNS} FROM calls \
             WHERE conversation_id = ANY($1) AND ended_at IS NULL ORDER BY started_at"
        ))
        .bind(conversation_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load active calls"))?;
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let call_ids: Vec<Uuid> = calls.iter().map(|c| c.id).collect();
        let members = sqlx::query_as::<_, LiveMember>(
            "SELECT call_id, user_id FROM call_participants \
             WHERE call_id = ANY($1) AND left_at IS NULL ORDER BY joined_at",
        )
        .bind(&call_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load call participants"))?;

        let mut by_call: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for member in members {
            by_call.entry(member.call_id).or_default().push(member.user_id);
        }

        Ok(calls
            .into_iter()
            .map(|call| {
                let participants = by_call.remove(&call.id).unwrap_or_default();
                ActiveCall { call, participants }
            })
            .collect())
    }

    async fn start_or_get_active(
        &self,
        conversation_id: Uuid,
        starter_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<(Call, bool)> {
        let mut tx = self.begin().await?;

        let inserted = sqlx::query_as::<_, Call>(&format!(
            "INSERT INTO calls (id, conversation_id, started_by, started_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (conversation_id) WHERE ended_at IS NULL DO NOTHING \
             RETURNING {CALL_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(conversation_id)
        .bind(starter_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to start call"))?;

        let result = match inserted {
            Some(call) => {
                sqlx::query(
                    "INSERT INTO call_participants (call_id, user_id, joined_at) VALUES ($1, $2, $3)",
                )
                .bind(call.id)
                .bind(starter_id)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to add call starter"))?;
                (call, true)
            }
            None => {
                let existing = sqlx::query_as::<_, Call>(&format!(
                    "SELECT {CALL_COLUMNS} FROM calls \
                     WHERE conversation_id = $1 AND ended_at IS NULL"
                ))
                .bind(conversation_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("Failed to find active call"))?;
                // The conflicting call ended between the insert and this read.
                let call = existing
                    .ok_or_else(|| AppError::gone("Active call ended concurrently"))?;
                (call, false)
            }
        };

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Ok(result)
    }

    async fn add_participant(&self, call_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let mut tx = self.begin().await?;

        let call = Self::lock_call(&mut tx, call_id)
            .await?
            .ok_or_else(|| AppError::not_found("Call not found"))?;
        if !call.is_active() {
            return Err(AppError::gone("Call has ended"));
        }

        let result = sqlx::query(
            "INSERT INTO call_participants (call_id, user_id, joined_at) VALUES ($1, $2, $3) \
             ON CONFLICT (call_id, user_id) WHERE left_at IS NULL DO NOTHING",
        )
        .bind(call_id)
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to join call"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_left(&self, call_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE call_participants SET left_at = $3 \
             WHERE call_id = $1 AND user_id = $2 AND left_at IS NULL",
        )
        .bind(call_id)
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to leave call"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_active_participants(&self, call_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM call_participants WHERE call_id = $1 AND left_at IS NULL",
        )
        .bind(call_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count call participants"))
    }

    async fn try_end(&self, call_id: Uuid, now: DateTime<Utc>, force: bool) -> AppResult<Option<Call>> {
        let mut tx = self.begin().await?;

        let Some(call) = Self::lock_call(&mut tx, call_id).await? else {
            return Err(AppError::not_found("Call not found"));
        };
        if !call.is_active() {
            return Ok(None);
        }

        if force {
            sqlx::query(
                "UPDATE call_participants SET left_at = $2 WHERE call_id = $1 AND left_at IS NULL",
            )
            .bind(call_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to close call participants"))?;
        } else {
            let live: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM call_participants WHERE call_id = $1 AND left_at IS NULL",
            )
            .bind(call_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to count call participants"))?;
            if live > 0 {
                return Ok(None);
            }
        }

        let ended = sqlx::query_as::<_, Call>(&format!(
            "UPDATE calls SET ended_at = $2 WHERE id = $1 AND ended_at IS NULL \
             RETURNING {CALL_COLUMNS}"
        ))
        .bind(call_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to end call"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Ok(ended)
    }

    async fn participant_history(&self, call_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM call_participants WHERE call_id = $1 \
             GROUP BY user_id ORDER BY MIN(joined_at)",
        )
        .bind(call_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load call history"))
    }
}
