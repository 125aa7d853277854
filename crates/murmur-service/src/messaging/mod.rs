//! Messages, reactions, and conversation membership.

pub mod conversation;
pub mod service;

pub use conversation::ConversationService;
pub use service::MessageService;

/// Maximum message length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Maximum group name length, in characters.
pub const MAX_GROUP_NAME_CHARS: usize = 100;

/// Maximum reaction length, in characters.
pub const MAX_EMOJI_CHARS: usize = 32;

/// Messages per page when the caller does not ask for a size.
pub const DEFAULT_MESSAGE_PAGE: i64 = 50;

/// Largest page of messages served at once.
pub const MAX_MESSAGE_PAGE: i64 = 100;
