//! Ready-state aggregation.

use std::fmt::Display;
use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use murmur_core::error::AppError;
use murmur_core::result::AppResult;
use murmur_database::store::{CallStore, ConversationStore, SocialGraphStore, UserStore};
use murmur_entity::user::{PresenceStatus, User};

use crate::message::{ActiveCallInfo, ReadyState};
use crate::presence::PresenceTracker;

/// Builds the `READY` snapshot for a subscribing user.
///
/// Only the profile lookup is critical. Every other lookup degrades to an
/// empty list, so partial data availability never locks a user out.
#[derive(Clone)]
pub struct ReadyAggregator {
    users: Arc<dyn UserStore>,
    social: Arc<dyn SocialGraphStore>,
    conversations: Arc<dyn ConversationStore>,
    calls: Arc<dyn CallStore>,
    presence: Arc<PresenceTracker>,
}

impl std::fmt::Debug for ReadyAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadyAggregator").finish()
    }
}

impl ReadyAggregator {
    /// Creates a new aggregator.
    pub fn new(
        users: Arc<dyn UserStore>,
        social: Arc<dyn SocialGraphStore>,
        conversations: Arc<dyn ConversationStore>,
        calls: Arc<dyn CallStore>,
        presence: Arc<PresenceTracker>,
    ) -> Self {
        Self {
            users,
            social,
            conversations,
            calls,
            presence,
        }
    }

    /// Build the snapshot. Fails only when the user cannot be loaded.
    pub async fn build(&self, user_id: Uuid) -> AppResult<ReadyState> {
        let (user, friends, incoming, outgoing, conversations) = tokio::join!(
            self.users.find_user(user_id),
            self.social.friends(user_id),
            self.social.incoming_requests(user_id),
            self.social.outgoing_requests(user_id),
            self.conversations.user_conversations(user_id),
        );

        let user = user?.ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        let friends = or_empty(user_id, "friends", friends);
        let incoming_requests = or_empty(user_id, "incoming requests", incoming);
        let outgoing_requests = or_empty(user_id, "outgoing requests", outgoing);
        let conversations = or_empty(user_id, "conversations", conversations);

        let active_calls = if conversations.is_empty() {
            Vec::new()
        } else {
            let ids: Vec<Uuid> = conversations.iter().map(|c| c.id).collect();
            or_empty(
                user_id,
                "active calls",
                self.calls.active_calls_for_conversations(&ids).await,
            )
            .into_iter()
            .map(ActiveCallInfo::from)
            .collect()
        };

        let mut state = ReadyState {
            user,
            friends,
            incoming_requests,
            outgoing_requests,
            conversations,
            active_calls,
        };
        self.apply_presence(&mut state);
        Ok(state)
    }

    /// Overwrite every embedded user's stored status with live presence.
    fn apply_presence(&self, state: &mut ReadyState) {
        let stamp = |user: &mut User| {
            user.status = PresenceStatus::from_online(self.presence.is_online(user.id));
        };

        stamp(&mut state.user);
        for friend in &mut state.friends {
            stamp(&mut friend.user);
        }
        for conversation in &mut state.conversations {
            for participant in &mut conversation.participants {
                stamp(participant);
            }
        }
    }
}

fn or_empty<T, E: Display>(user_id: Uuid, what: &str, result: Result<Vec<T>, E>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(user_id = %user_id, error = %e, "Failed to load {what} for ready state");
        Vec::new()
    })
}
