//! HTTP surface over the in-memory backend.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use murmur_api::{AppState, build_app};
use murmur_auth::JwtEncoder;
use murmur_core::config::AppConfig;
use murmur_database::{DatabasePool, MemoryStore, Stores};
use murmur_entity::user::User;
use murmur_realtime::MemoryPubSub;

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    encoder: JwtEncoder,
}

impl TestApp {
    fn new() -> Self {
        let config = AppConfig::default();
        let store = Arc::new(MemoryStore::new());
        let pubsub = Arc::new(MemoryPubSub::new(config.realtime.channel_buffer_size));
        let encoder = JwtEncoder::new(&config.auth);
        let state = AppState::new(config, Stores::from_single(store.clone()), pubsub);
        Self {
            router: build_app(state),
            store,
            encoder,
        }
    }

    async fn user(&self, name: &str) -> (User, String) {
        let user = self
            .store
            .insert_user(&format!("{name}@example.com"), Some(name))
            .await;
        let (token, _) = self.encoder.generate_access_token(user.id).unwrap();
        (user, token)
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn dm(&self, token: &str, other: Uuid) -> String {
        let (status, body) = self
            .call(Method::POST, "/api/conversations/dm", Some(token), Some(json!({ "user_id": other })))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn health_reports_presence_and_metrics() {
    let app = TestApp::new();

    let (status, body) = app.call(Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "memory");
    assert_eq!(body["data"]["online_users"], 0);
    assert_eq!(body["data"]["realtime"]["ready_delivered"], 0);
}

#[tokio::test]
async fn health_is_unavailable_when_postgres_is_down() {
    let config = AppConfig::default();
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://murmur@127.0.0.1:1/murmur")
        .unwrap();
    let database = DatabasePool::from_pool(pool);
    database.close().await;
    let state = AppState::new(
        config,
        Stores::from_single(Arc::new(MemoryStore::new())),
        Arc::new(MemoryPubSub::new(8)),
    )
    .with_database(database);

    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let response = build_app(state).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn requests_without_valid_bearer_are_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .call(Method::POST, "/api/calls/start", None, Some(json!({ "conversation_id": Uuid::new_v4() })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = app
        .call(
            Method::POST,
            "/api/calls/start",
            Some("not-a-jwt"),
            Some(json!({ "conversation_id": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn call_lifecycle_over_http() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice").await;
    let (bob_user, bob) = app.user("bob").await;
    let conversation = app.dm(&alice, bob_user.id).await;

    let (status, body) = app
        .call(Method::POST, "/api/calls/start", Some(&alice), Some(json!({ "conversation_id": conversation })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["started"], true);
    assert!(!body["data"]["token"].as_str().unwrap().is_empty());
    let call_id = body["data"]["call_id"].clone();

    let (status, body) = app
        .call(Method::POST, "/api/calls/join", Some(&bob), Some(json!({ "call_id": call_id })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["started"], false);

    let uri = format!("/api/conversations/{conversation}/call");
    let (_, body) = app.call(Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(body["data"]["participants"].as_array().unwrap().len(), 2);

    let (_, body) = app
        .call(Method::POST, "/api/calls/leave", Some(&alice), Some(json!({ "call_id": call_id })))
        .await;
    assert_eq!(body["data"]["outcome"], "left");
    let (_, body) = app
        .call(Method::POST, "/api/calls/leave", Some(&bob), Some(json!({ "call_id": call_id })))
        .await;
    assert_eq!(body["data"]["outcome"], "ended");

    let (status, body) = app
        .call(Method::POST, "/api/calls/join", Some(&bob), Some(json!({ "call_id": call_id })))
        .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], "GONE");

    let (_, body) = app.call(Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn outsiders_get_forbidden() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice").await;
    let (bob_user, _) = app.user("bob").await;
    let (_, mallory) = app.user("mallory").await;
    let conversation = app.dm(&alice, bob_user.id).await;

    let (status, body) = app
        .call(Method::POST, "/api/calls/start", Some(&mallory), Some(json!({ "conversation_id": conversation })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let uri = format!("/api/conversations/{conversation}/messages");
    let (status, _) = app
        .call(Method::POST, &uri, Some(&mallory), Some(json!({ "content": "hi" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_bodies_are_bad_requests() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice").await;
    let (bob_user, _) = app.user("bob").await;
    let conversation = app.dm(&alice, bob_user.id).await;
    let uri = format!("/api/conversations/{conversation}/messages");

    let (status, body) = app
        .call(Method::POST, &uri, Some(&alice), Some(json!({ "content": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, _) = app
        .call(Method::POST, &uri, Some(&alice), Some(json!({ "content": "x".repeat(4001) })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(Method::POST, "/api/conversations/groups", Some(&alice), Some(json!({ "member_ids": [] })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn friend_request_round_trip() {
    let app = TestApp::new();
    let (alice_user, alice) = app.user("alice").await;
    let (bob_user, bob) = app.user("bob").await;

    let (status, body) = app
        .call(Method::POST, "/api/friends/requests", Some(&alice), Some(json!({ "user_id": bob_user.id })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let request_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .call(Method::POST, "/api/friends/requests", Some(&alice), Some(json!({ "user_id": bob_user.id })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/api/friends/requests/{request_id}/accept");
    let (status, body) = app.call(Method::POST, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "accepted");

    let uri = format!("/api/friends/{}", alice_user.id);
    let (status, _) = app.call(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn friend_lists_and_blocks_over_http() {
    let app = TestApp::new();
    let (alice_user, alice) = app.user("alice").await;
    let (bob_user, bob) = app.user("bob").await;

    let (status, _) = app
        .call(Method::POST, "/api/friends/requests/username", Some(&alice), Some(json!({ "username": "bob" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.call(Method::GET, "/api/friends/requests/incoming", Some(&bob), None).await;
    assert_eq!(body["data"][0]["user"]["id"], alice_user.id.to_string());
    let (_, body) = app.call(Method::GET, "/api/friends/requests/outgoing", Some(&alice), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (_, body) = app.call(Method::GET, "/api/friends", Some(&alice), None).await;
    assert_eq!(body["data"], json!([]));

    let (status, body) = app
        .call(Method::POST, "/api/blocks", Some(&bob), Some(json!({ "user_id": alice_user.id })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["blocked_id"], alice_user.id.to_string());
    let (_, body) = app.call(Method::GET, "/api/friends/requests/incoming", Some(&bob), None).await;
    assert_eq!(body["data"], json!([]));

    let (status, body) = app
        .call(Method::POST, "/api/friends/requests", Some(&alice), Some(json!({ "user_id": bob_user.id })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let (_, body) = app.call(Method::GET, "/api/blocks", Some(&bob), None).await;
    assert_eq!(body["data"][0]["user"]["id"], alice_user.id.to_string());
    let uri = format!("/api/blocks/{}", alice_user.id);
    let (status, _) = app.call(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(Method::POST, "/api/friends/requests/username", Some(&alice), Some(json!({ "username": "nobody" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn conversation_reads_over_http() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice").await;
    let (bob_user, bob) = app.user("bob").await;
    let (_, mallory) = app.user("mallory").await;
    let conversation = app.dm(&alice, bob_user.id).await;
    let messages = format!("/api/conversations/{conversation}/messages");
    for text in ["one", "two", "three"] {
        let (status, _) = app
            .call(Method::POST, &messages, Some(&bob), Some(json!({ "content": text })))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = app.call(Method::GET, "/api/conversations", Some(&alice), None).await;
    assert_eq!(body["data"][0]["id"], conversation);

    let uri = format!("/api/conversations/{conversation}");
    let (status, body) = app.call(Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["participants"].as_array().unwrap().len(), 2);
    let (status, _) = app.call(Method::GET, &uri, Some(&mallory), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let page = format!("{messages}?limit=2&offset=1");
    let (status, body) = app.call(Method::GET, &page, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let contents: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["one", "two"]);
    let (status, _) = app.call(Method::GET, &messages, Some(&mallory), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn websocket_handshake_requires_a_valid_token() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice").await;

    let (status, _) = app.call(Method::GET, "/ws", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.call(Method::GET, "/ws?token=garbage", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A good token passes the handshake check; the plain GET then fails
    // the upgrade itself.
    let uri = format!("/ws?token={alice}");
    let (status, _) = app.call(Method::GET, &uri, None, None).await;
    assert_ne!(status, StatusCode::UNAUTHORIZED);
    assert!(status.is_client_error());
}
