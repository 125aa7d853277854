//! Event fan-out publisher.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use murmur_core::error::AppError;
use murmur_core::result::AppResult;

use crate::channel::ChannelType;
use crate::message::{EventEnvelope, EventType};
use crate::metrics::RealtimeMetrics;
use crate::pubsub::{PubSub, Publication};

/// Wraps payloads in the event envelope and publishes them to user channels.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    /// Substrate
    pubsub: Arc<dyn PubSub>,
    /// Shared engine metrics
    metrics: Arc<RealtimeMetrics>,
}

impl EventPublisher {
    /// Create a publisher over a substrate
    pub fn new(pubsub: Arc<dyn PubSub>, metrics: Arc<RealtimeMetrics>) -> Self {
        Self { pubsub, metrics }
    }

    /// Publish one event to one user.
    pub async fn publish_to_user<T>(
        &self,
        user_id: Uuid,
        event_type: EventType,
        data: &T,
    ) -> AppResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let payload = EventEnvelope::new(event_type, data).encode()?;
        self.send(user_id, event_type, payload).await
    }

    /// Publish one event to many users.
    ///
    /// The payload is serialized once. A failed publish to one recipient is
    /// logged and skipped. Returns how many publishes succeeded.
    pub async fn publish_to_users<T>(
        &self,
        user_ids: &[Uuid],
        event_type: EventType,
        data: &T,
    ) -> usize
    where
        T: Serialize + Sync + ?Sized,
    {
        if user_ids.is_empty() {
            return 0;
        }
        let payload = match EventEnvelope::new(event_type, data).encode() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(event = %event_type, error = %e, "Failed to encode event");
                return 0;
            }
        };

        let mut delivered = 0;
        for user_id in user_ids {
            match self.send(*user_id, event_type, payload.clone()).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(user_id = %user_id, event = %event_type, error = %e, "Failed to publish to user");
                }
            }
        }
        delivered
    }

    async fn send(&self, user_id: Uuid, event_type: EventType, payload: Publication) -> AppResult<()> {
        let channel = ChannelType::user_channel(user_id);
        match self.pubsub.publish(&channel, payload).await {
            Ok(()) => {
                RealtimeMetrics::inc(&self.metrics.events_published);
                debug!(user_id = %user_id, event = %event_type, "Event published");
                Ok(())
            }
            Err(e) => {
                RealtimeMetrics::inc(&self.metrics.publish_failures);
                Err(AppError::publish(format!(
                    "Failed to publish {event_type} to {channel}: {}",
                    e.message
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::broadcast;

    use murmur_core::error::ErrorKind;

    use super::*;
    use crate::pubsub::MemoryPubSub;

    /// Refuses publishes to a fixed set of channels.
    #[derive(Debug)]
    struct FlakyPubSub {
        inner: MemoryPubSub,
        broken: HashSet<String>,
    }

    #[async_trait]
    impl PubSub for FlakyPubSub {
        async fn publish(&self, channel: &str, payload: Publication) -> AppResult<()> {
            if self.broken.contains(channel) {
                return Err(AppError::publish("channel unavailable"));
            }
            self.inner.publish(channel, payload).await
        }

        async fn subscribe(&self, channel: &str) -> AppResult<broadcast::Receiver<Publication>> {
            self.inner.subscribe(channel).await
        }

        async fn release(&self, channel: &str) {
            self.inner.release(channel).await
        }
    }

    #[tokio::test]
    async fn publish_to_user_delivers_envelope() {
        let pubsub = Arc::new(MemoryPubSub::new(8));
        let publisher = EventPublisher::new(pubsub.clone(), Arc::new(RealtimeMetrics::new()));
        let user = Uuid::new_v4();
        let mut rx = pubsub
            .subscribe(&ChannelType::user_channel(user))
            .await
            .unwrap();

        let data = json!({"message_id": "m1", "conversation_id": "c1"});
        publisher
            .publish_to_user(user, EventType::MessageDelete, &data)
            .await
            .unwrap();

        let received = EventEnvelope::decode(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(received.event_type, EventType::MessageDelete);
        assert_eq!(received.data, data);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn one_broken_recipient_does_not_block_others() {
        let bad = Uuid::new_v4();
        let good = Uuid::new_v4();
        let pubsub = Arc::new(FlakyPubSub {
            inner: MemoryPubSub::new(8),
            broken: HashSet::from([ChannelType::user_channel(bad)]),
        });
        let metrics = Arc::new(RealtimeMetrics::new());
        let publisher = EventPublisher::new(pubsub.clone(), metrics.clone());
        let mut rx = pubsub
            .subscribe(&ChannelType::user_channel(good))
            .await
            .unwrap();

        let delivered = publisher
            .publish_to_users(&[bad, good], EventType::RelationshipRemove, &json!({"user_id": "x"}))
            .await;

        assert_eq!(delivered, 1);
        assert!(rx.recv().await.is_ok());
        assert_eq!(metrics.snapshot().publish_failures, 1);

        let err = publisher
            .publish_to_user(bad, EventType::RelationshipRemove, &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Publish);
    }
}
