//! Presence-change fan-out to friends.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use murmur_database::store::SocialGraphStore;
use murmur_entity::user::PresenceStatus;

use super::PresenceTracker;
use crate::message::{EventType, PresenceUpdate};
use crate::publisher::EventPublisher;

/// Last status announced for a user, `None` before the first announcement.
type Announced = Arc<Mutex<Option<PresenceStatus>>>;

/// Announces online/offline transitions to a user's friends.
///
/// Callers invoke this on a presence edge reported by [`PresenceTracker`].
/// Notifications for one user run one at a time and always announce the
/// tracker's status at the moment they run, so friends end on the user's
/// real status however the edge tasks interleave.
#[derive(Clone)]
pub struct PresenceNotifier {
    social: Arc<dyn SocialGraphStore>,
    publisher: EventPublisher,
    presence: Arc<PresenceTracker>,
    announced: Arc<DashMap<Uuid, Announced>>,
}

impl std::fmt::Debug for PresenceNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceNotifier")
            .field("in_flight", &self.announced.len())
            .finish()
    }
}

impl PresenceNotifier {
    /// Creates a new notifier.
    pub fn new(
        social: Arc<dyn SocialGraphStore>,
        publisher: EventPublisher,
        presence: Arc<PresenceTracker>,
    ) -> Self {
        Self {
            social,
            publisher,
            presence,
            announced: Arc::new(DashMap::new()),
        }
    }

    /// Publish `PRESENCE_UPDATE` with the user's current status to every
    /// friend of `user_id`.
    ///
    /// Skips the fan-out when that status was already the last one
    /// announced. If the friend list cannot be loaded nothing is published.
    pub async fn notify_presence_change(&self, user_id: Uuid) {
        let slot = self.announced.entry(user_id).or_default().clone();
        let mut last = slot.lock().await;

        let status = PresenceStatus::from_online(self.presence.is_online(user_id));
        if *last == Some(status) {
            debug!(user_id = %user_id, %status, "Presence unchanged since last announcement");
        } else {
            match self.social.friend_ids(user_id).await {
                Ok(friend_ids) => {
                    let update = PresenceUpdate { user_id, status };
                    let delivered = self
                        .publisher
                        .publish_to_users(&friend_ids, EventType::PresenceUpdate, &update)
                        .await;
                    *last = Some(status);
                    debug!(user_id = %user_id, %status, friends = friend_ids.len(), delivered, "Presence update fanned out");
                }
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Failed to load friends for presence update");
                }
            }
        }

        // Forget offline users once no other notification holds the slot.
        let settled_offline = *last == Some(PresenceStatus::Offline);
        drop(last);
        if settled_offline {
            self.announced
                .remove_if(&user_id, |_, held| Arc::strong_count(held) == 2);
        }
    }
}
