//! Publishing to every participant of a conversation.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use murmur_database::store::ConversationStore;
use murmur_realtime::{EventPublisher, EventType};

/// Resolves a conversation's participants and publishes to all of them.
///
/// The participant lookup is auxiliary: when it fails the event is not
/// published and the failure is only logged.
#[derive(Clone)]
pub struct ConversationFanout {
    conversations: Arc<dyn ConversationStore>,
    publisher: EventPublisher,
}

impl std::fmt::Debug for ConversationFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationFanout").finish()
    }
}

impl ConversationFanout {
    /// Creates a new fan-out helper.
    pub fn new(conversations: Arc<dyn ConversationStore>, publisher: EventPublisher) -> Self {
        Self {
            conversations,
            publisher,
        }
    }

    /// Publish to every current participant. Returns how many publishes succeeded.
    pub async fn to_participants<T>(&self, conversation_id: Uuid, event_type: EventType, data: &T) -> usize
    where
        T: Serialize + Sync + ?Sized,
    {
        match self.conversations.participant_ids(conversation_id).await {
            Ok(ids) => self.publisher.publish_to_users(&ids, event_type, data).await,
            Err(e) => {
                warn!(
                    conversation_id = %conversation_id,
                    event = %event_type,
                    error = %e,
                    "Failed to load participants for fan-out"
                );
                0
            }
        }
    }
}
