//! PostgreSQL implementations of the store traits.

pub mod call;
pub mod conversation;
pub mod message;
pub mod social;
pub mod user;

use std::sync::Arc;

use sqlx::PgPool;

use murmur_core::error::{AppError, ErrorKind};

use crate::store::Stores;

pub use call::PgCallRepository;
pub use conversation::PgConversationRepository;
pub use message::PgMessageRepository;
pub use social::PgSocialGraphRepository;
pub use user::PgUserRepository;

/// Column list shared by every query that materializes a [`murmur_entity::user::User`].
pub(crate) const USER_COLUMNS: &str =
    "u.id, u.email, u.username, u.avatar_url, u.status, u.created_at, u.updated_at";

/// Column list for [`murmur_entity::message::Message`] rows.
pub(crate) const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_id, content, kind, created_at, updated_at";

/// Build a `map_err` adapter that wraps a sqlx error as a database error.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

/// Build every PostgreSQL repository over one pool.
pub fn postgres_stores(pool: PgPool) -> Stores {
    Stores {
        users: Arc::new(PgUserRepository::new(pool.clone())),
        social: Arc::new(PgSocialGraphRepository::new(pool.clone())),
        conversations: Arc::new(PgConversationRepository::new(pool.clone())),
        messages: Arc::new(PgMessageRepository::new(pool.clone())),
        calls: Arc::new(PgCallRepository::new(pool)),
    }
}
