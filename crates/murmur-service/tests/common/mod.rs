#![allow(dead_code)]

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use murmur_auth::MediaTokenIssuer;
use murmur_core::config::CallsConfig;
use murmur_database::MemoryStore;
use murmur_entity::user::User;
use murmur_realtime::metrics::RealtimeMetrics;
use murmur_realtime::pubsub::{PubSub, Publication};
use murmur_realtime::{ChannelType, EventEnvelope, EventPublisher, EventType, MemoryPubSub};
use murmur_service::{CallService, ConversationService, FriendService, MessageService, RequestContext};

pub struct World {
    pub store: Arc<MemoryStore>,
    pub pubsub: Arc<MemoryPubSub>,
    pub calls: CallService,
    pub friends: FriendService,
    pub messages: MessageService,
    pub conversations: ConversationService,
}

pub fn world() -> World {
    let store = Arc::new(MemoryStore::new());
    let pubsub = Arc::new(MemoryPubSub::new(64));
    let publisher = EventPublisher::new(pubsub.clone(), Arc::new(RealtimeMetrics::new()));
    let calls_config = CallsConfig::default();

    World {
        calls: CallService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            publisher.clone(),
            Arc::new(MediaTokenIssuer::new(&calls_config)),
            &calls_config,
        ),
        friends: FriendService::new(store.clone(), store.clone(), publisher.clone()),
        messages: MessageService::new(store.clone(), store.clone(), publisher.clone()),
        conversations: ConversationService::new(store.clone(), store.clone(), publisher),
        store,
        pubsub,
    }
}

impl World {
    pub async fn user(&self, name: &str) -> User {
        self.store
            .insert_user(&format!("{name}@example.com"), Some(name))
            .await
    }

    pub async fn inbox(&self, user_id: Uuid) -> Inbox {
        Inbox(
            self.pubsub
                .subscribe(&ChannelType::user_channel(user_id))
                .await
                .unwrap(),
        )
    }
}

pub fn ctx(user: &User) -> RequestContext {
    RequestContext::new(user.id)
}

pub struct Inbox(broadcast::Receiver<Publication>);

impl Inbox {
    pub fn drain(&mut self) -> Vec<EventEnvelope<Value>> {
        let mut events = Vec::new();
        while let Ok(payload) = self.0.try_recv() {
            events.push(EventEnvelope::decode(&payload).unwrap());
        }
        events
    }

    /// Payloads of every pending event of one type, discarding the rest.
    pub fn take(&mut self, event_type: EventType) -> Vec<Value> {
        self.drain()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .map(|e| e.data)
            .collect()
    }
}
