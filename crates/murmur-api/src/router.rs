//! Route definitions for the Murmur HTTP API.
//!
//! REST routes are mounted under `/api`; the WebSocket transport lives at `/ws`.

use axum::Router;
use axum::routing::{delete, get, post};

use crate::handlers;
use crate::state::AppState;

/// Build the router with every route, threading `AppState` through.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(call_routes())
        .merge(friend_routes())
        .merge(conversation_routes())
        .merge(message_routes())
        .route("/health", get(handlers::health::health));

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_handler))
        .with_state(state)
}

/// Call lifecycle
fn call_routes() -> Router<AppState> {
    Router::new()
        .route("/calls/start", post(handlers::calls::start_call))
        .route("/calls/join", post(handlers::calls::join_call))
        .route("/calls/leave", post(handlers::calls::leave_call))
        .route("/calls/end", post(handlers::calls::end_call))
        .route("/conversations/{id}/call", get(handlers::calls::active_call))
}

/// Friends, friend requests, and blocks
fn friend_routes() -> Router<AppState> {
    Router::new()
        .route("/friends", get(handlers::friends::list_friends))
        .route("/friends/requests", post(handlers::friends::send_request))
        .route(
            "/friends/requests/username",
            post(handlers::friends::send_request_by_username),
        )
        .route(
            "/friends/requests/incoming",
            get(handlers::friends::incoming_requests),
        )
        .route(
            "/friends/requests/outgoing",
            get(handlers::friends::outgoing_requests),
        )
        .route(
            "/friends/requests/{id}/accept",
            post(handlers::friends::accept_request),
        )
        .route(
            "/friends/requests/{id}/decline",
            post(handlers::friends::decline_request),
        )
        .route(
            "/friends/requests/{id}",
            delete(handlers::friends::cancel_request),
        )
        .route("/friends/{id}", delete(handlers::friends::remove_friend))
        .route(
            "/blocks",
            get(handlers::friends::list_blocks).post(handlers::friends::block_user),
        )
        .route("/blocks/{id}", delete(handlers::friends::unblock_user))
}

/// DMs and groups
fn conversation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations",
            get(handlers::conversations::list_conversations),
        )
        .route("/conversations/dm", post(handlers::conversations::create_dm))
        .route(
            "/conversations/groups",
            post(handlers::conversations::create_group),
        )
        .route(
            "/conversations/{id}",
            get(handlers::conversations::get_conversation)
                .put(handlers::conversations::rename_group),
        )
        .route(
            "/conversations/{id}/participants",
            post(handlers::conversations::add_participants),
        )
        .route(
            "/conversations/{id}/leave",
            post(handlers::conversations::leave_group),
        )
}

/// Messages and reactions
fn message_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations/{id}/messages",
            get(handlers::messages::list_messages).post(handlers::messages::send_message),
        )
        .route("/messages/{id}", delete(handlers::messages::delete_message))
        .route(
            "/messages/{id}/reactions",
            post(handlers::messages::add_reaction),
        )
        .route(
            "/messages/{id}/reactions/{emoji}",
            delete(handlers::messages::remove_reaction),
        )
}
