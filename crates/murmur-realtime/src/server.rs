//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, oneshot};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use uuid::Uuid;

use murmur_auth::JwtDecoder;
use murmur_core::config::RealtimeConfig;
use murmur_core::result::AppResult;
use murmur_database::store::Stores;

use crate::channel::ChannelAuthorizer;
use crate::message::EventType;
use crate::metrics::RealtimeMetrics;
use crate::presence::{PresenceNotifier, PresenceTracker};
use crate::publisher::EventPublisher;
use crate::pubsub::{PubSub, Publication};
use crate::ready::ReadyAggregator;

/// Central real-time engine driven by the transport.
///
/// Presence notifications and READY deliveries run as background tasks
/// whose results the caller never observes. They are tracked so that
/// [`RealtimeEngine::flush`] can wait for all of them.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Presence tracker.
    pub presence: Arc<PresenceTracker>,
    /// Handshake and subscribe checks.
    pub authorizer: ChannelAuthorizer,
    /// Event publisher shared with the services.
    pub publisher: EventPublisher,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
    pubsub: Arc<dyn PubSub>,
    ready: ReadyAggregator,
    notifier: PresenceNotifier,
    tasks: TaskTracker,
    ready_confirm_timeout: Duration,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

/// Handed out by [`RealtimeEngine::on_subscribe`]. READY is published only
/// after the transport confirms it is listening on the channel.
///
/// Dropping the ticket unconfirmed cancels the delivery.
#[derive(Debug)]
pub struct ReadyTicket {
    confirm: oneshot::Sender<()>,
}

impl ReadyTicket {
    /// Signal that the subscriber's listener is registered.
    pub fn confirm(self) {
        // The delivery task may already have timed out.
        let _ = self.confirm.send(());
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine with all subsystems.
    pub fn new(
        config: &RealtimeConfig,
        decoder: Arc<JwtDecoder>,
        pubsub: Arc<dyn PubSub>,
        stores: &Stores,
    ) -> Self {
        let metrics = Arc::new(RealtimeMetrics::new());
        let presence = Arc::new(PresenceTracker::new());
        let publisher = EventPublisher::new(pubsub.clone(), metrics.clone());
        let ready = ReadyAggregator::new(
            stores.users.clone(),
            stores.social.clone(),
            stores.conversations.clone(),
            stores.calls.clone(),
            presence.clone(),
        );
        let notifier =
            PresenceNotifier::new(stores.social.clone(), publisher.clone(), presence.clone());

        info!("Real-time engine initialized");

        Self {
            presence,
            authorizer: ChannelAuthorizer::new(decoder),
            publisher,
            metrics,
            pubsub,
            ready,
            notifier,
            tasks: TaskTracker::new(),
            ready_confirm_timeout: Duration::from_millis(config.ready_confirm_timeout_ms),
        }
    }

    /// Handshake check: resolve a bearer token to a user id.
    pub fn authenticate(&self, token: &str) -> AppResult<Uuid> {
        self.authorizer.authenticate(token)
    }

    /// Register a new connection. On the offline → online edge the user's
    /// friends are notified in the background. Returns the edge flag.
    pub fn on_connect(&self, user_id: Uuid) -> bool {
        RealtimeMetrics::inc(&self.metrics.connections_opened);
        let came_online = self.presence.connect(user_id);
        info!(user_id = %user_id, came_online, "Client connected");
        if came_online {
            self.spawn_presence_change(user_id);
        }
        came_online
    }

    /// Drop a connection. On the online → offline edge the user's friends
    /// are notified in the background. Returns the edge flag.
    pub fn on_disconnect(&self, user_id: Uuid) -> bool {
        RealtimeMetrics::inc(&self.metrics.connections_closed);
        let went_offline = self.presence.disconnect(user_id);
        info!(user_id = %user_id, went_offline, "Client disconnected");
        if went_offline {
            self.spawn_presence_change(user_id);
        }
        went_offline
    }

    /// Subscribe check plus READY preparation.
    ///
    /// Refuses any channel other than the user's own, and refuses the
    /// subscription when the user's profile cannot be loaded. On success
    /// the snapshot is already built; it is published once the returned
    /// ticket is confirmed, or dropped if confirmation does not arrive
    /// within the configured timeout.
    pub async fn on_subscribe(&self, user_id: Uuid, channel: &str) -> AppResult<ReadyTicket> {
        if let Err(e) = self.authorizer.authorize_subscribe(user_id, channel) {
            RealtimeMetrics::inc(&self.metrics.subscriptions_rejected);
            warn!(user_id = %user_id, channel, "Subscription refused");
            return Err(e);
        }

        let state = match self.ready.build(user_id).await {
            Ok(state) => state,
            Err(e) => {
                RealtimeMetrics::inc(&self.metrics.subscriptions_rejected);
                warn!(user_id = %user_id, error = %e, "Failed to build ready state");
                return Err(e);
            }
        };
        RealtimeMetrics::inc(&self.metrics.subscriptions_accepted);

        let (confirm, confirmed) = oneshot::channel();
        let publisher = self.publisher.clone();
        let metrics = self.metrics.clone();
        let timeout = self.ready_confirm_timeout;
        self.tasks.spawn(async move {
            match tokio::time::timeout(timeout, confirmed).await {
                Ok(Ok(())) => {
                    match publisher
                        .publish_to_user(user_id, EventType::Ready, &state)
                        .await
                    {
                        Ok(()) => RealtimeMetrics::inc(&metrics.ready_delivered),
                        Err(e) => warn!(user_id = %user_id, error = %e, "Failed to send READY"),
                    }
                }
                Ok(Err(_)) => debug!(user_id = %user_id, "Subscription abandoned before READY"),
                Err(_) => warn!(user_id = %user_id, "Subscription not confirmed in time, READY dropped"),
            }
        });

        Ok(ReadyTicket { confirm })
    }

    /// Listen on a substrate channel.
    pub async fn listen(&self, channel: &str) -> AppResult<broadcast::Receiver<Publication>> {
        self.pubsub.subscribe(channel).await
    }

    /// Let the substrate forget a channel nobody listens to.
    pub async fn release(&self, channel: &str) {
        self.pubsub.release(channel).await;
    }

    /// Wait until every background task spawned so far has finished.
    pub async fn flush(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Stop accepting background work and wait for what is in flight.
    pub async fn shutdown(&self) {
        info!(pending = self.tasks.len(), "Shutting down real-time engine");
        self.tasks.close();
        self.tasks.wait().await;
        info!("Real-time engine shut down");
    }

    fn spawn_presence_change(&self, user_id: Uuid) {
        RealtimeMetrics::inc(&self.metrics.presence_edges);
        let notifier = self.notifier.clone();
        self.tasks.spawn(async move {
            notifier.notify_presence_change(user_id).await;
        });
    }
}
