//! Friend request flows and their notifications.

mod common;

use murmur_core::error::ErrorKind;
use murmur_database::store::SocialGraphStore;
use murmur_entity::friendship::FriendRequestStatus;
use murmur_realtime::EventType;

use common::{ctx, world};

#[tokio::test]
async fn request_notifies_target_only() {
    let w = world();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let mut alice_inbox = w.inbox(alice.id).await;
    let mut bob_inbox = w.inbox(bob.id).await;

    let request = w.friends.send_request(&ctx(&alice), bob.id).await.unwrap();
    assert_eq!(request.status, FriendRequestStatus::Pending);

    let created = bob_inbox.take(EventType::FriendRequestCreate);
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["request"]["id"], request.id.to_string());
    assert_eq!(created[0]["request"]["user"]["id"], alice.id.to_string());
    assert!(alice_inbox.drain().is_empty());
}

#[tokio::test]
async fn reciprocal_request_makes_friends_on_both_sides() {
    let w = world();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    w.friends.send_request(&ctx(&alice), bob.id).await.unwrap();
    let mut alice_inbox = w.inbox(alice.id).await;
    let mut bob_inbox = w.inbox(bob.id).await;

    let request = w.friends.send_request(&ctx(&bob), alice.id).await.unwrap();

    assert_eq!(request.status, FriendRequestStatus::Accepted);
    let to_alice = alice_inbox.take(EventType::RelationshipAdd);
    let to_bob = bob_inbox.take(EventType::RelationshipAdd);
    assert_eq!(to_alice[0]["friend"]["user"]["id"], bob.id.to_string());
    assert_eq!(to_bob[0]["friend"]["user"]["id"], alice.id.to_string());
    assert_eq!(w.store.friend_ids(alice.id).await.unwrap(), vec![bob.id]);
}

#[tokio::test]
async fn accept_adds_relationship_and_clears_request() {
    let w = world();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let request = w.friends.send_request(&ctx(&alice), bob.id).await.unwrap();
    let mut alice_inbox = w.inbox(alice.id).await;

    w.friends.accept_request(&ctx(&bob), request.id).await.unwrap();

    let events = alice_inbox.drain();
    let kinds: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
    assert_eq!(kinds, vec![EventType::RelationshipAdd, EventType::FriendRequestDelete]);
    assert_eq!(events[1].data["request_id"], request.id.to_string());
    assert_eq!(events[1].data["user_id"], bob.id.to_string());
    assert!(w.store.incoming_requests(bob.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn only_the_target_may_accept() {
    let w = world();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let request = w.friends.send_request(&ctx(&alice), bob.id).await.unwrap();

    let err = w.friends.accept_request(&ctx(&alice), request.id).await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotFound | ErrorKind::Authorization));
}

#[tokio::test]
async fn decline_and_cancel_notify_the_other_side() {
    let w = world();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let carol = w.user("carol").await;
    let declined = w.friends.send_request(&ctx(&alice), bob.id).await.unwrap();
    let cancelled = w.friends.send_request(&ctx(&alice), carol.id).await.unwrap();
    let mut alice_inbox = w.inbox(alice.id).await;
    let mut carol_inbox = w.inbox(carol.id).await;

    w.friends.decline_request(&ctx(&bob), declined.id).await.unwrap();
    w.friends.cancel_request(&ctx(&alice), cancelled.id).await.unwrap();

    let to_alice = alice_inbox.take(EventType::FriendRequestDelete);
    assert_eq!(to_alice.len(), 1);
    assert_eq!(to_alice[0]["request_id"], declined.id.to_string());
    let to_carol = carol_inbox.take(EventType::FriendRequestDelete);
    assert_eq!(to_carol.len(), 1);
    assert_eq!(to_carol[0]["request_id"], cancelled.id.to_string());
    assert_eq!(to_carol[0]["user_id"], alice.id.to_string());
    assert!(w.store.outgoing_requests(alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn removing_a_friend_notifies_both() {
    let w = world();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    w.store.insert_friendship(alice.id, bob.id).await;
    let mut alice_inbox = w.inbox(alice.id).await;
    let mut bob_inbox = w.inbox(bob.id).await;

    w.friends.remove_friend(&ctx(&alice), bob.id).await.unwrap();

    assert_eq!(
        alice_inbox.take(EventType::RelationshipRemove)[0]["user_id"],
        bob.id.to_string()
    );
    assert_eq!(
        bob_inbox.take(EventType::RelationshipRemove)[0]["user_id"],
        alice.id.to_string()
    );
    assert!(w.store.friend_ids(bob.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_targets_are_rejected() {
    let w = world();
    let alice = w.user("alice").await;

    let err = w.friends.send_request(&ctx(&alice), alice.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    let err = w
        .friends
        .send_request(&ctx(&alice), uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn requests_by_username_and_listings() {
    let w = world();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;

    let request = w
        .friends
        .send_request_by_username(&ctx(&alice), " bob ")
        .await
        .unwrap();
    assert_eq!(request.to_user_id, bob.id);
    let err = w
        .friends
        .send_request_by_username(&ctx(&alice), "nobody")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let outgoing = w.friends.outgoing_requests(&ctx(&alice)).await.unwrap();
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0].user.id, bob.id);
    let incoming = w.friends.incoming_requests(&ctx(&bob)).await.unwrap();
    assert_eq!(incoming[0].user.id, alice.id);
    assert!(w.friends.friends(&ctx(&alice)).await.unwrap().is_empty());

    w.friends.accept_request(&ctx(&bob), request.id).await.unwrap();
    let friends = w.friends.friends(&ctx(&alice)).await.unwrap();
    assert_eq!(friends.len(), 1);
    assert_eq!(friends[0].user.id, bob.id);
}

#[tokio::test]
async fn blocking_a_friend_removes_the_friendship() {
    let w = world();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    w.store.insert_friendship(alice.id, bob.id).await;
    let mut alice_inbox = w.inbox(alice.id).await;
    let mut bob_inbox = w.inbox(bob.id).await;

    let block = w.friends.block_user(&ctx(&alice), bob.id).await.unwrap();
    assert_eq!(block.blocked_id, bob.id);

    let to_alice = alice_inbox.take(EventType::RelationshipRemove);
    let to_bob = bob_inbox.take(EventType::RelationshipRemove);
    assert_eq!(to_alice[0]["user_id"], bob.id.to_string());
    assert_eq!(to_bob[0]["user_id"], alice.id.to_string());
    assert!(w.store.friend_ids(alice.id).await.unwrap().is_empty());

    let blocks = w.friends.blocks(&ctx(&alice)).await.unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].user.id, bob.id);
}

#[tokio::test]
async fn blocked_pairs_cannot_exchange_requests() {
    let w = world();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let pending = w.friends.send_request(&ctx(&bob), alice.id).await.unwrap();
    let mut bob_inbox = w.inbox(bob.id).await;

    w.friends.block_user(&ctx(&alice), bob.id).await.unwrap();
    let deleted = bob_inbox.take(EventType::FriendRequestDelete);
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0]["request_id"], pending.id.to_string());
    assert_eq!(deleted[0]["user_id"], alice.id.to_string());

    for (from, to) in [(&alice, &bob), (&bob, &alice)] {
        let err = w.friends.send_request(&ctx(from), to.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }
    assert!(bob_inbox.drain().is_empty());

    w.friends.unblock_user(&ctx(&alice), bob.id).await.unwrap();
    w.friends.send_request(&ctx(&bob), alice.id).await.unwrap();
    let err = w.friends.unblock_user(&ctx(&alice), bob.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = w.friends.block_user(&ctx(&alice), alice.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}
