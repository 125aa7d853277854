//! Friend, friend request, and block handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use murmur_entity::friendship::{
    Block, BlockWithUser, FriendRequest, FriendRequestWithUser, FriendWithUser,
};

use crate::dto::request::{BlockRequest, FriendRequestBody, UsernameRequestBody};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidJson};
use crate::state::AppState;

/// GET /api/friends
pub async fn list_friends(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<FriendWithUser>>>, ApiError> {
    let friends = state.friends.friends(&auth).await?;
    Ok(Json(ApiResponse::ok(friends)))
}

/// GET /api/friends/requests/incoming
pub async fn incoming_requests(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<FriendRequestWithUser>>>, ApiError> {
    let requests = state.friends.incoming_requests(&auth).await?;
    Ok(Json(ApiResponse::ok(requests)))
}

/// GET /api/friends/requests/outgoing
pub async fn outgoing_requests(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<FriendRequestWithUser>>>, ApiError> {
    let requests = state.friends.outgoing_requests(&auth).await?;
    Ok(Json(ApiResponse::ok(requests)))
}

/// POST /api/friends/requests/username
pub async fn send_request_by_username(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<UsernameRequestBody>,
) -> Result<Json<ApiResponse<FriendRequest>>, ApiError> {
    let request = state
        .friends
        .send_request_by_username(&auth, &req.username)
        .await?;
    Ok(Json(ApiResponse::ok(request)))
}

/// POST /api/friends/requests
pub async fn send_request(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<FriendRequestBody>,
) -> Result<Json<ApiResponse<FriendRequest>>, ApiError> {
    let request = state.friends.send_request(&auth, req.user_id).await?;
    Ok(Json(ApiResponse::ok(request)))
}

/// POST /api/friends/requests/{id}/accept
pub async fn accept_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FriendRequest>>, ApiError> {
    let request = state.friends.accept_request(&auth, id).await?;
    Ok(Json(ApiResponse::ok(request)))
}

/// POST /api/friends/requests/{id}/decline
pub async fn decline_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.friends.decline_request(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Friend request declined"))))
}

/// DELETE /api/friends/requests/{id}
pub async fn cancel_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.friends.cancel_request(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Friend request cancelled"))))
}

/// DELETE /api/friends/{id}
pub async fn remove_friend(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(friend_id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.friends.remove_friend(&auth, friend_id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Friend removed"))))
}

/// GET /api/blocks
pub async fn list_blocks(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<BlockWithUser>>>, ApiError> {
    let blocks = state.friends.blocks(&auth).await?;
    Ok(Json(ApiResponse::ok(blocks)))
}

/// POST /api/blocks
pub async fn block_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<BlockRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Block>>), ApiError> {
    let block = state.friends.block_user(&auth, req.user_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(block))))
}

/// DELETE /api/blocks/{id}
pub async fn unblock_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.friends.unblock_user(&auth, user_id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("User unblocked"))))
}
