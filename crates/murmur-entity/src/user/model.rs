//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::PresenceStatus;

/// A registered chat user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Public handle, if one has been claimed.
    pub username: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Presence status. The stored value may be stale; live views
    /// overwrite it from the presence tracker.
    pub status: PresenceStatus,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name shown to other users: the username, or the email local part.
    pub fn display_name(&self) -> &str {
        match &self.username {
            Some(name) => name,
            None => self.email.split('@').next().unwrap_or(&self.email),
        }
    }

    /// Overwrite the status field with a live value.
    pub fn with_status(mut self, status: PresenceStatus) -> Self {
        self.status = status;
        self
    }
}
