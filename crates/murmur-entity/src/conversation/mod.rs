//! Conversations (direct messages and groups).

pub mod kind;
pub mod model;

pub use kind::ConversationKind;
pub use model::{Conversation, ConversationWithDetails};
