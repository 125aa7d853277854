//! Call session and participant rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One call session scoped to a conversation.
///
/// A session is active while `ended_at` is `None`. At most one active
/// session exists per conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Call {
    /// Call identifier.
    pub id: Uuid,
    /// Owning conversation.
    pub conversation_id: Uuid,
    /// User who started the call.
    pub started_by: Uuid,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// End time; set exactly once.
    pub ended_at: Option<DateTime<Utc>>,
}

impl Call {
    /// Whether the call is still live.
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Whole seconds between start and end, if ended.
    pub fn duration_seconds(&self) -> Option<i64> {
        self.ended_at
            .map(|ended| (ended - self.started_at).num_seconds().max(0))
    }
}

/// Membership of one user in one call.
///
/// A user holds at most one row with `left_at == None` per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CallParticipant {
    /// The call.
    pub call_id: Uuid,
    /// The participant.
    pub user_id: Uuid,
    /// When the user joined.
    pub joined_at: DateTime<Utc>,
    /// When the user left, if they have.
    pub left_at: Option<DateTime<Utc>>,
}

impl CallParticipant {
    /// Whether this row is a live membership.
    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }
}

/// An active call together with its live participant ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveCall {
    /// The call session.
    pub call: Call,
    /// Users currently holding a live membership row.
    pub participants: Vec<Uuid>,
}
