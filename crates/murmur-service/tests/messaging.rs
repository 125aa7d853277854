//! Messaging and group membership through the services.

mod common;

use murmur_core::error::ErrorKind;
use murmur_database::store::ConversationStore;
use murmur_entity::message::MessageKind;
use murmur_realtime::EventType;

use common::{ctx, world};

#[tokio::test]
async fn message_reaches_every_participant() {
    let w = world();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let dm = w.conversations.get_or_create_dm(&ctx(&alice), bob.id).await.unwrap();
    let mut alice_inbox = w.inbox(alice.id).await;
    let mut bob_inbox = w.inbox(bob.id).await;

    let message = w
        .messages
        .send_message(&ctx(&alice), dm.id, "  hello  ")
        .await
        .unwrap();

    assert_eq!(message.content, "hello");
    assert_eq!(message.kind, MessageKind::Text);
    for inbox in [&mut alice_inbox, &mut bob_inbox] {
        let created = inbox.take(EventType::MessageCreate);
        assert_eq!(created.len(), 1);
        assert_eq!(created[0]["message"]["id"], message.id.to_string());
        assert_eq!(created[0]["conversation_id"], dm.id.to_string());
    }
}

#[tokio::test]
async fn content_is_validated() {
    let w = world();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let dm = w.conversations.get_or_create_dm(&ctx(&alice), bob.id).await.unwrap();

    let err = w.messages.send_message(&ctx(&alice), dm.id, "   ").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    let long = "x".repeat(4001);
    let err = w.messages.send_message(&ctx(&alice), dm.id, &long).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    let exact = "é".repeat(4000);
    assert!(w.messages.send_message(&ctx(&alice), dm.id, &exact).await.is_ok());
}

#[tokio::test]
async fn outsiders_cannot_post_or_react() {
    let w = world();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let mallory = w.user("mallory").await;
    let dm = w.conversations.get_or_create_dm(&ctx(&alice), bob.id).await.unwrap();
    let message = w.messages.send_message(&ctx(&alice), dm.id, "hi").await.unwrap();

    let err = w.messages.send_message(&ctx(&mallory), dm.id, "hi").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    let err = w
        .messages
        .add_reaction(&ctx(&mallory), message.id, "👍")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn reactions_and_deletes_fan_out() {
    let w = world();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let dm = w.conversations.get_or_create_dm(&ctx(&alice), bob.id).await.unwrap();
    let message = w.messages.send_message(&ctx(&alice), dm.id, "hi").await.unwrap();
    let mut alice_inbox = w.inbox(alice.id).await;

    let reaction = w.messages.add_reaction(&ctx(&bob), message.id, "👍").await.unwrap();
    assert_eq!(reaction.user_id, bob.id);
    w.messages.remove_reaction(&ctx(&bob), message.id, "👍").await.unwrap();
    let err = w.messages.delete_message(&ctx(&bob), message.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    w.messages.delete_message(&ctx(&alice), message.id).await.unwrap();

    let events = alice_inbox.drain();
    let kinds: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
    assert_eq!(
        kinds,
        vec![EventType::ReactionAdd, EventType::ReactionRemove, EventType::MessageDelete]
    );
    assert_eq!(events[0].data["reaction"]["emoji"], "👍");
    assert_eq!(events[1].data["user_id"], bob.id.to_string());
    assert_eq!(events[2].data["message_id"], message.id.to_string());

    let err = w.messages.add_reaction(&ctx(&bob), message.id, "👍").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn group_lifecycle_notifies_members() {
    let w = world();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let carol = w.user("carol").await;
    let mut bob_inbox = w.inbox(bob.id).await;

    let group = w
        .conversations
        .create_group(&ctx(&alice), None, &[bob.id, bob.id, alice.id])
        .await
        .unwrap();
    assert_eq!(group.name.as_deref(), Some("Group Chat"));
    assert_eq!(group.participants.len(), 2);
    assert_eq!(bob_inbox.take(EventType::ConversationCreate).len(), 1);

    let mut carol_inbox = w.inbox(carol.id).await;
    w.conversations
        .add_participants(&ctx(&alice), group.id, &[carol.id])
        .await
        .unwrap();
    assert_eq!(bob_inbox.take(EventType::ConversationUpdate).len(), 1);
    let carol_events = carol_inbox.drain();
    assert!(carol_events.iter().any(|e| e.event_type == EventType::ConversationCreate));

    let err = w
        .conversations
        .rename_group(&ctx(&bob), group.id, "mine")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    let renamed = w
        .conversations
        .rename_group(&ctx(&alice), group.id, " weekend ")
        .await
        .unwrap();
    assert_eq!(renamed.name.as_deref(), Some("weekend"));
    assert_eq!(
        bob_inbox.take(EventType::ConversationUpdate)[0]["name"],
        "weekend"
    );

    w.conversations.leave_group(&ctx(&bob), group.id).await.unwrap();
    let to_carol = carol_inbox.take(EventType::ConversationUpdate);
    assert_eq!(to_carol.len(), 2);
    assert_eq!(to_carol[1]["participants"].as_array().unwrap().len(), 2);
    assert!(bob_inbox.drain().is_empty());
    assert!(!w.store.is_participant(group.id, bob.id).await.unwrap());
}

#[tokio::test]
async fn dm_with_self_or_unknown_user_is_rejected() {
    let w = world();
    let alice = w.user("alice").await;

    let err = w.conversations.get_or_create_dm(&ctx(&alice), alice.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    let err = w
        .conversations
        .get_or_create_dm(&ctx(&alice), uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn history_and_conversation_reads_require_membership() {
    let w = world();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let mallory = w.user("mallory").await;
    let dm = w.conversations.get_or_create_dm(&ctx(&alice), bob.id).await.unwrap();
    for text in ["one", "two", "three"] {
        w.messages.send_message(&ctx(&bob), dm.id, text).await.unwrap();
    }

    let page = w
        .messages
        .list_messages(&ctx(&alice), dm.id, Some(2), None)
        .await
        .unwrap();
    let contents: Vec<&str> = page.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["two", "three"]);
    let all = w
        .messages
        .list_messages(&ctx(&alice), dm.id, Some(500), Some(-3))
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let fetched = w.conversations.get_conversation(&ctx(&bob), dm.id).await.unwrap();
    assert_eq!(fetched.id, dm.id);
    assert_eq!(fetched.last_message.map(|m| m.content), Some("three".to_string()));
    let listed = w.conversations.list_conversations(&ctx(&alice)).await.unwrap();
    assert_eq!(listed.len(), 1);

    let err = w
        .messages
        .list_messages(&ctx(&mallory), dm.id, None, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    let err = w
        .conversations
        .get_conversation(&ctx(&mallory), dm.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert!(w.conversations.list_conversations(&ctx(&mallory)).await.unwrap().is_empty());
}
