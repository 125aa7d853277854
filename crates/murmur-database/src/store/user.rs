//! User profile lookups.

use async_trait::async_trait;
use uuid::Uuid;

use murmur_core::AppResult;
use murmur_entity::user::User;

/// Read access to user profiles.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by id.
    async fn find_user(&self, user_id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by exact username.
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;
}
