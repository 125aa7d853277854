//! Conversation handlers: DMs and groups.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use murmur_entity::conversation::ConversationWithDetails;

use crate::dto::request::{
    AddParticipantsRequest, CreateDmRequest, CreateGroupRequest, RenameGroupRequest,
};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidJson};
use crate::state::AppState;

/// GET /api/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<ConversationWithDetails>>>, ApiError> {
    let conversations = state.conversations.list_conversations(&auth).await?;
    Ok(Json(ApiResponse::ok(conversations)))
}

/// GET /api/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ConversationWithDetails>>, ApiError> {
    let conversation = state.conversations.get_conversation(&auth, id).await?;
    Ok(Json(ApiResponse::ok(conversation)))
}

/// POST /api/conversations/dm
pub async fn create_dm(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CreateDmRequest>,
) -> Result<Json<ApiResponse<ConversationWithDetails>>, ApiError> {
    let conversation = state.conversations.get_or_create_dm(&auth, req.user_id).await?;
    Ok(Json(ApiResponse::ok(conversation)))
}

/// POST /api/conversations/groups
pub async fn create_group(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CreateGroupRequest>,
) -> Result<Json<ApiResponse<ConversationWithDetails>>, ApiError> {
    let conversation = state
        .conversations
        .create_group(&auth, req.name.as_deref(), &req.member_ids)
        .await?;
    Ok(Json(ApiResponse::ok(conversation)))
}

/// POST /api/conversations/{id}/participants
pub async fn add_participants(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<AddParticipantsRequest>,
) -> Result<Json<ApiResponse<ConversationWithDetails>>, ApiError> {
    let conversation = state
        .conversations
        .add_participants(&auth, id, &req.user_ids)
        .await?;
    Ok(Json(ApiResponse::ok(conversation)))
}

/// PUT /api/conversations/{id}
pub async fn rename_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<RenameGroupRequest>,
) -> Result<Json<ApiResponse<ConversationWithDetails>>, ApiError> {
    let conversation = state.conversations.rename_group(&auth, id, &req.name).await?;
    Ok(Json(ApiResponse::ok(conversation)))
}

/// POST /api/conversations/{id}/leave
pub async fn leave_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.conversations.leave_group(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Left group"))))
}
