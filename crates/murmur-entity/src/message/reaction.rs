//! Reaction entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An emoji reaction left by one user on one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Reaction {
    /// Reaction identifier.
    pub id: Uuid,
    /// Target message.
    pub message_id: Uuid,
    /// Reacting user.
    pub user_id: Uuid,
    /// The emoji itself.
    pub emoji: String,
    /// When the reaction was added.
    pub created_at: DateTime<Utc>,
}
