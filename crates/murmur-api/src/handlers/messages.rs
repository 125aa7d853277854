//! Message and reaction handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use murmur_entity::message::{Message, Reaction};

use crate::dto::request::{MessagePageQuery, ReactionRequest, SendMessageRequest};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidJson};
use crate::state::AppState;

/// GET /api/conversations/{id}/messages?limit=&offset=
pub async fn list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(conversation_id): Path<Uuid>,
    Query(page): Query<MessagePageQuery>,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    let messages = state
        .messages
        .list_messages(&auth, conversation_id, page.limit, page.offset)
        .await?;
    Ok(Json(ApiResponse::ok(messages)))
}

/// POST /api/conversations/{id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(conversation_id): Path<Uuid>,
    ValidJson(req): ValidJson<SendMessageRequest>,
) -> Result<Json<ApiResponse<Message>>, ApiError> {
    let message = state
        .messages
        .send_message(&auth, conversation_id, &req.content)
        .await?;
    Ok(Json(ApiResponse::ok(message)))
}

/// DELETE /api/messages/{id}
pub async fn delete_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.messages.delete_message(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Message deleted"))))
}

/// POST /api/messages/{id}/reactions
pub async fn add_reaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<ReactionRequest>,
) -> Result<Json<ApiResponse<Reaction>>, ApiError> {
    let reaction = state.messages.add_reaction(&auth, id, &req.emoji).await?;
    Ok(Json(ApiResponse::ok(reaction)))
}

/// DELETE /api/messages/{id}/reactions/{emoji}
pub async fn remove_reaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, emoji)): Path<(Uuid, String)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.messages.remove_reaction(&auth, id, &emoji).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Reaction removed"))))
}
