//! Friend and friend-request repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use murmur_core::error::AppError;
use murmur_core::result::AppResult;
use murmur_entity::friendship::{
    Block, BlockWithUser, FriendRequest, FriendRequestStatus, FriendRequestWithUser, FriendWithUser,
};
use murmur_entity::user::User;

use super::{USER_COLUMNS, db_error};
use crate::store::SocialGraphStore;

const REQUEST_COLUMNS: &str = "id, from_user_id, to_user_id, status, created_at, updated_at";
const BLOCK_COLUMNS: &str = "id, blocker_id, blocked_id, created_at";

#[derive(FromRow)]
struct FriendRow {
    friendship_id: Uuid,
    since: DateTime<Utc>,
    #[sqlx(flatten)]
    user: User,
}

impl From<FriendRow> for FriendWithUser {
    fn from(row: FriendRow) -> Self {
        Self {
            friendship_id: row.friendship_id,
            user: row.user,
            since: row.since,
        }
    }
}

#[derive(FromRow)]
struct RequestRow {
    request_id: Uuid,
    request_status: FriendRequestStatus,
    request_created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    user: User,
}

impl From<RequestRow> for FriendRequestWithUser {
    fn from(row: RequestRow) -> Self {
        Self {
            id: row.request_id,
            status: row.request_status,
            user: row.user,
            created_at: row.request_created_at,
        }
    }
}

#[derive(FromRow)]
struct BlockRow {
    block_id: Uuid,
    block_created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    user: User,
}

impl From<BlockRow> for BlockWithUser {
    fn from(row: BlockRow) -> Self {
        Self {
            id: row.block_id,
            user: row.user,
            created_at: row.block_created_at,
        }
    }
}

/// PostgreSQL-backed [`SocialGraphStore`].
#[derive(Debug, Clone)]
pub struct PgSocialGraphRepository {
    pool: PgPool,
}

impl PgSocialGraphRepository {
    /// Create a new social graph repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn friend_rows(&self, user_id: Uuid, friend_id: Option<Uuid>) -> AppResult<Vec<FriendWithUser>> {
        let rows = sqlx::query_as::<_, FriendRow>(&format!(
            "SELECT fr.id AS friendship_id, fr.updated_at AS since, {USER_COLUMNS} \
             FROM friend_requests fr \
             JOIN users u ON u.id = CASE WHEN fr.from_user_id = $1 THEN fr.to_user_id ELSE fr.from_user_id END \
             WHERE fr.status = 'accepted' AND (fr.from_user_id = $1 OR fr.to_user_id = $1) \
             AND ($2::uuid IS NULL OR u.id = $2) \
             ORDER BY u.username NULLS LAST, u.email"
        ))
        .bind(user_id)
        .bind(friend_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load friends"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn pending_rows(&self, user_id: Uuid, incoming: bool) -> AppResult<Vec<FriendRequestWithUser>> {
        let (own_side, other_side) = if incoming {
            ("to_user_id", "from_user_id")
        } else {
            ("from_user_id", "to_user_id")
        };
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT fr.id AS request_id, fr.status AS request_status, \
             fr.created_at AS request_created_at, {USER_COLUMNS} \
             FROM friend_requests fr JOIN users u ON u.id = fr.{other_side} \
             WHERE fr.{own_side} = $1 AND fr.status = 'pending' \
             ORDER BY fr.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load friend requests"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl SocialGraphStore for PgSocialGraphRepository {
    async fn friend_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT CASE WHEN from_user_id = $1 THEN to_user_id ELSE from_user_id END \
             FROM friend_requests \
             WHERE status = 'accepted' AND (from_user_id = $1 OR to_user_id = $1)",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load friend ids"))
    }

    async fn friends(&self, user_id: Uuid) -> AppResult<Vec<FriendWithUser>> {
        self.friend_rows(user_id, None).await
    }

    async fn incoming_requests(&self, user_id: Uuid) -> AppResult<Vec<FriendRequestWithUser>> {
        self.pending_rows(user_id, true).await
    }

    async fn outgoing_requests(&self, user_id: Uuid) -> AppResult<Vec<FriendRequestWithUser>> {
        self.pending_rows(user_id, false).await
    }

    async fn find_request(&self, request_id: Uuid) -> AppResult<Option<FriendRequest>> {
        sqlx::query_as::<_, FriendRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE id = $1"
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find friend request"))
    }

    async fn request_with_user(
        &self,
        request_id: Uuid,
        viewer_id: Uuid,
    ) -> AppResult<Option<FriendRequestWithUser>> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT fr.id AS request_id, fr.status AS request_status, \
             fr.created_at AS request_created_at, {USER_COLUMNS} \
             FROM friend_requests fr \
             JOIN users u ON u.id = CASE WHEN fr.from_user_id = $2 THEN fr.to_user_id ELSE fr.from_user_id END \
             WHERE fr.id = $1"
        ))
        .bind(request_id)
        .bind(viewer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find friend request"))?;

        Ok(row.map(Into::into))
    }

    async fn find_friend(&self, user_id: Uuid, friend_id: Uuid) -> AppResult<Option<FriendWithUser>> {
        Ok(self.friend_rows(user_id, Some(friend_id)).await?.into_iter().next())
    }

    async fn send_request(&self, from: Uuid, to: Uuid) -> AppResult<FriendRequest> {
        if from == to {
            return Err(AppError::validation("Cannot send a friend request to yourself"));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let target_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(to)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error("Failed to check user"))?;
        if !target_exists {
            return Err(AppError::not_found("User not found"));
        }

        let blocked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM blocks \
             WHERE (blocker_id = $1 AND blocked_id = $2) OR (blocker_id = $2 AND blocked_id = $1))",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to check blocks"))?;
        if blocked {
            return Err(AppError::authorization("Cannot send request to this user"));
        }

        let existing = sqlx::query_as::<_, FriendRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests \
             WHERE (from_user_id = $1 AND to_user_id = $2) OR (from_user_id = $2 AND to_user_id = $1) \
             FOR UPDATE"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("Failed to check existing requests"))?;

        for request in &existing {
            match request.status {
                FriendRequestStatus::Accepted => {
                    return Err(AppError::conflict("Already friends"));
                }
                FriendRequestStatus::Pending if request.from_user_id == to => {
                    let accepted = sqlx::query_as::<_, FriendRequest>(&format!(
                        "UPDATE friend_requests SET status = 'accepted', updated_at = NOW() \
                         WHERE id = $1 RETURNING {REQUEST_COLUMNS}"
                    ))
                    .bind(request.id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(db_error("Failed to accept friend request"))?;
                    tx.commit()
                        .await
                        .map_err(db_error("Failed to commit transaction"))?;
                    return Ok(accepted);
                }
                FriendRequestStatus::Pending => {
                    return Err(AppError::conflict("Friend request already sent"));
                }
                FriendRequestStatus::Declined => {}
            }
        }

        // Declined rows would trip the (from, to) uniqueness on re-send.
        sqlx::query(
            "DELETE FROM friend_requests WHERE status = 'declined' \
             AND ((from_user_id = $1 AND to_user_id = $2) OR (from_user_id = $2 AND to_user_id = $1))",
        )
        .bind(from)
        .bind(to)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to clear declined requests"))?;

        let request = sqlx::query_as::<_, FriendRequest>(&format!(
            "INSERT INTO friend_requests (id, from_user_id, to_user_id, status) \
             VALUES ($1, $2, $3, 'pending') RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(from)
        .bind(to)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to create friend request"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Ok(request)
    }

    async fn accept_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<FriendRequest> {
        sqlx::query_as::<_, FriendRequest>(&format!(
            "UPDATE friend_requests SET status = 'accepted', updated_at = NOW() \
             WHERE id = $1 AND to_user_id = $2 AND status = 'pending' \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(request_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to accept friend request"))?
        .ok_or_else(|| AppError::not_found("Friend request not found"))
    }

    async fn decline_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<FriendRequest> {
        sqlx::query_as::<_, FriendRequest>(&format!(
            "UPDATE friend_requests SET status = 'declined', updated_at = NOW() \
             WHERE id = $1 AND to_user_id = $2 AND status = 'pending' \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(request_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to decline friend request"))?
        .ok_or_else(|| AppError::not_found("Friend request not found"))
    }

    async fn cancel_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<FriendRequest> {
        sqlx::query_as::<_, FriendRequest>(&format!(
            "DELETE FROM friend_requests \
             WHERE id = $1 AND from_user_id = $2 AND status = 'pending' \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(request_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to cancel friend request"))?
        .ok_or_else(|| AppError::not_found("Friend request not found"))
    }

    async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "DELETE FROM friend_requests WHERE status = 'accepted' \
             AND ((from_user_id = $1 AND to_user_id = $2) OR (from_user_id = $2 AND to_user_id = $1))",
        )
        .bind(user_id)
        .bind(friend_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to remove friend"))?;

        if result.rows_affected() == 0 {
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

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let target_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(blocked_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error("Failed to check user"))?;
        if !target_exists {
            return Err(AppError::not_found("User not found"));
        }

        let removed = sqlx::query_as::<_, FriendRequest>(&format!(
            "DELETE FROM friend_requests \
             WHERE (from_user_id = $1 AND to_user_id = $2) OR (from_user_id = $2 AND to_user_id = $1) \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(blocker_id)
        .bind(blocked_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("Failed to clear friend requests"))?;

        sqlx::query(
            "INSERT INTO blocks (id, blocker_id, blocked_id) VALUES ($1, $2, $3) \
             ON CONFLICT (blocker_id, blocked_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(blocker_id)
        .bind(blocked_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to create block"))?;

        let block = sqlx::query_as::<_, Block>(&format!(
            "SELECT {BLOCK_COLUMNS} FROM blocks WHERE blocker_id = $1 AND blocked_id = $2"
        ))
        .bind(blocker_id)
        .bind(blocked_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to load block"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Ok((block, removed))
    }

    async fn unblock_user(&self, blocker_id: Uuid, blocked_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM blocks WHERE blocker_id = $1 AND blocked_id = $2")
            .bind(blocker_id)
            .bind(blocked_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to remove block"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Block not found"));
        }
        Ok(())
    }

    async fn blocked_users(&self, blocker_id: Uuid) -> AppResult<Vec<BlockWithUser>> {
        let rows = sqlx::query_as::<_, BlockRow>(&format!(
            "SELECT b.id AS block_id, b.created_at AS block_created_at, {USER_COLUMNS} \
             FROM blocks b JOIN users u ON u.id = b.blocked_id \
             WHERE b.blocker_id = $1 \
             ORDER BY b.created_at DESC"
        ))
        .bind(blocker_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load blocks"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn is_blocked(&self, a: Uuid, b: Uuid) -> AppResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM blocks \
             WHERE (blocker_id = $1 AND blocked_id = $2) OR (blocker_id = $2 AND blocked_id = $1))",
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to check blocks"))
    }
}
