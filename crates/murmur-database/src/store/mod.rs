//! Collaborator store traits.
//!
//! Every method is a single atomic unit against the backing store. The
//! call-session methods in particular are compare-and-swap primitives; the
//! state machine built on top of them never performs a read-then-write
//! across two calls without tolerating the loss of that race.

pub mod call;
pub mod conversation;
pub mod message;
pub mod social;
pub mod user;

use std::sync::Arc;

pub use call::CallStore;
pub use conversation::ConversationStore;
pub use message::MessageStore;
pub use social::SocialGraphStore;
pub use user::UserStore;

/// Bundle of every store handle, shared across the application.
#[derive(Clone)]
pub struct Stores {
    /// User profiles.
    pub users: Arc<dyn UserStore>,
    /// Friends and friend requests.
    pub social: Arc<dyn SocialGraphStore>,
    /// Conversations and their membership.
    pub conversations: Arc<dyn ConversationStore>,
    /// Messages and reactions.
    pub messages: Arc<dyn MessageStore>,
    /// Call sessions and participants.
    pub calls: Arc<dyn CallStore>,
}

impl Stores {
    /// Use one value that implements every store trait.
    pub fn from_single<S>(store: Arc<S>) -> Self
    where
        S: UserStore + SocialGraphStore + ConversationStore + MessageStore + CallStore + 'static,
    {
        Self {
            users: store.clone(),
            social: store.clone(),
            conversations: store.clone(),
            messages: store.clone(),
            calls: store,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
