//! Engine lifecycle tests over the in-memory store and substrate.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use uuid::Uuid;

use murmur_auth::{JwtDecoder, JwtEncoder};
use murmur_core::config::{AuthConfig, RealtimeConfig};
use murmur_core::error::ErrorKind;
use murmur_database::{MemoryStore, Stores};
use murmur_realtime::message::{EventEnvelope, EventType, ReadyState};
use murmur_realtime::pubsub::Publication;
use murmur_realtime::{ChannelType, MemoryPubSub, RealtimeEngine};

use common::{DownSocialGraph, SlowFirstFriends};

struct Harness {
    store: MemoryStore,
    engine: RealtimeEngine,
    encoder: JwtEncoder,
}

fn harness() -> Harness {
    let store = MemoryStore::new();
    let stores = Stores::from_single(Arc::new(store.clone()));
    Harness {
        engine: engine_over(&stores),
        store,
        encoder: JwtEncoder::new(&AuthConfig::default()),
    }
}

fn engine_over(stores: &Stores) -> RealtimeEngine {
    RealtimeEngine::new(
        &RealtimeConfig::default(),
        Arc::new(JwtDecoder::new(&AuthConfig::default())),
        Arc::new(MemoryPubSub::new(64)),
        stores,
    )
}

async fn listen(engine: &RealtimeEngine, user_id: Uuid) -> broadcast::Receiver<Publication> {
    engine
        .listen(&ChannelType::user_channel(user_id))
        .await
        .unwrap()
}

fn drain(rx: &mut broadcast::Receiver<Publication>) -> Vec<EventEnvelope<serde_json::Value>> {
    let mut events = Vec::new();
    while let Ok(payload) = rx.try_recv() {
        events.push(EventEnvelope::decode(&payload).unwrap());
    }
    events
}

#[tokio::test]
async fn presence_update_fires_once_per_edge() {
    let h = harness();
    let alice = h.store.insert_user("alice@example.com", Some("alice")).await;
    let bob = h.store.insert_user("bob@example.com", Some("bob")).await;
    h.store.insert_friendship(alice.id, bob.id).await;
    let mut bob_rx = listen(&h.engine, bob.id).await;

    assert!(h.engine.on_connect(alice.id));
    assert!(!h.engine.on_connect(alice.id));
    h.engine.flush().await;

    let events = drain(&mut bob_rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::PresenceUpdate);
    assert_eq!(events[0].data["user_id"], alice.id.to_string());
    assert_eq!(events[0].data["status"], "online");

    assert!(!h.engine.on_disconnect(alice.id));
    h.engine.flush().await;
    assert!(drain(&mut bob_rx).is_empty());

    assert!(h.engine.on_disconnect(alice.id));
    h.engine.flush().await;
    let events = drain(&mut bob_rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data["status"], "offline");

    assert_eq!(h.engine.metrics.snapshot().presence_edges, 2);
}

#[tokio::test]
async fn friends_end_on_the_real_status_when_edges_interleave() {
    let store = MemoryStore::new();
    let mut stores = Stores::from_single(Arc::new(store.clone()));
    stores.social = Arc::new(SlowFirstFriends::new(store.clone(), Duration::from_millis(50)));
    let engine = engine_over(&stores);
    let alice = store.insert_user("alice@example.com", Some("alice")).await;
    let bob = store.insert_user("bob@example.com", Some("bob")).await;
    store.insert_friendship(alice.id, bob.id).await;
    let mut bob_rx = listen(&engine, bob.id).await;

    assert!(engine.on_connect(alice.id));
    // Let the online announcement start and stall on its friend lookup.
    for _ in 0..3 {
        tokio::task::yield_now().await;
    }
    assert!(engine.on_disconnect(alice.id));
    engine.flush().await;

    let statuses: Vec<String> = drain(&mut bob_rx)
        .into_iter()
        .filter(|e| e.event_type == EventType::PresenceUpdate)
        .map(|e| e.data["status"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(statuses.last().map(String::as_str), Some("offline"));
    assert!(!engine.presence.is_online(alice.id));

    // A later edge is announced again.
    assert!(engine.on_connect(alice.id));
    engine.flush().await;
    let events = drain(&mut bob_rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data["status"], "online");
}

#[tokio::test]
async fn failed_friend_lookup_publishes_nothing() {
    let store = MemoryStore::new();
    let mut stores = Stores::from_single(Arc::new(store.clone()));
    stores.social = Arc::new(DownSocialGraph);
    let engine = engine_over(&stores);
    let alice = store.insert_user("alice@example.com", Some("alice")).await;
    let bob = store.insert_user("bob@example.com", Some("bob")).await;
    store.insert_friendship(alice.id, bob.id).await;
    let mut bob_rx = listen(&engine, bob.id).await;

    assert!(engine.on_connect(alice.id));
    engine.flush().await;

    assert!(drain(&mut bob_rx).is_empty());
    assert!(engine.presence.is_online(alice.id));
    assert_eq!(engine.metrics.snapshot().presence_edges, 1);
}

#[tokio::test]
async fn handshake_resolves_token_owner() {
    let h = harness();
    let user = Uuid::new_v4();
    let (token, _) = h.encoder.generate_access_token(user).unwrap();

    assert_eq!(h.engine.authenticate(&token).unwrap(), user);
    let err = h.engine.authenticate("garbage").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
}

#[tokio::test]
async fn subscribing_to_another_users_channel_is_refused() {
    let h = harness();
    let alice = h.store.insert_user("alice@example.com", None).await;
    let bob = h.store.insert_user("bob@example.com", None).await;

    let err = h
        .engine
        .on_subscribe(alice.id, &ChannelType::user_channel(bob.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert_eq!(h.engine.metrics.snapshot().subscriptions_rejected, 1);
}

#[tokio::test]
async fn subscribing_as_unknown_user_is_refused() {
    let h = harness();
    let ghost = Uuid::new_v4();

    let err = h
        .engine
        .on_subscribe(ghost, &ChannelType::user_channel(ghost))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn ready_is_sent_once_after_confirmation() {
    let h = harness();
    let alice = h.store.insert_user("alice@example.com", Some("alice")).await;
    let bob = h.store.insert_user("bob@example.com", Some("bob")).await;
    h.store.insert_friendship(alice.id, bob.id).await;
    h.engine.on_connect(bob.id);
    h.engine.on_connect(alice.id);
    h.engine.flush().await;

    let channel = ChannelType::user_channel(alice.id);
    let mut rx = listen(&h.engine, alice.id).await;
    drain(&mut rx);

    let ticket = h.engine.on_subscribe(alice.id, &channel).await.unwrap();
    assert!(drain(&mut rx).is_empty());
    ticket.confirm();
    h.engine.flush().await;

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::Ready);
    let ready: ReadyState = serde_json::from_value(events[0].data.clone()).unwrap();
    assert_eq!(ready.user.id, alice.id);
    assert_eq!(ready.friends.len(), 1);
    assert_eq!(ready.friends[0].user.id, bob.id);
    assert_eq!(ready.friends[0].user.status.as_str(), "online");
    assert_eq!(h.engine.metrics.snapshot().ready_delivered, 1);
}

#[tokio::test]
async fn dropped_ticket_sends_no_ready() {
    let h = harness();
    let alice = h.store.insert_user("alice@example.com", None).await;
    let channel = ChannelType::user_channel(alice.id);
    let mut rx = listen(&h.engine, alice.id).await;

    let ticket = h.engine.on_subscribe(alice.id, &channel).await.unwrap();
    drop(ticket);
    h.engine.flush().await;

    assert!(drain(&mut rx).is_empty());
    assert_eq!(h.engine.metrics.snapshot().ready_delivered, 0);
}

#[tokio::test]
async fn unconfirmed_ticket_expires() {
    let auth = AuthConfig::default();
    let store = MemoryStore::new();
    let config = RealtimeConfig {
        ready_confirm_timeout_ms: 20,
        ..RealtimeConfig::default()
    };
    let engine = RealtimeEngine::new(
        &config,
        Arc::new(JwtDecoder::new(&auth)),
        Arc::new(MemoryPubSub::new(8)),
        &Stores::from_single(Arc::new(store.clone())),
    );
    let alice = store.insert_user("alice@example.com", None).await;
    let mut rx = listen(&engine, alice.id).await;

    let ticket = engine
        .on_subscribe(alice.id, &ChannelType::user_channel(alice.id))
        .await
        .unwrap();
    engine.flush().await;
    ticket.confirm();

    assert!(drain(&mut rx).is_empty());
}
