//! Call handlers.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use murmur_entity::call::CallEndInfo;
use murmur_realtime::message::ActiveCallInfo;
use murmur_service::{CallJoin, LeaveOutcome};

use crate::dto::request::{CallIdRequest, StartCallRequest};
use crate::dto::response::{ApiResponse, LeaveCallResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidJson};
use crate::state::AppState;

/// POST /api/calls/start
pub async fn start_call(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<StartCallRequest>,
) -> Result<Json<ApiResponse<CallJoin>>, ApiError> {
    let join = state.calls.start_or_join(&auth, req.conversation_id).await?;
    Ok(Json(ApiResponse::ok(join)))
}

/// POST /api/calls/join
pub async fn join_call(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CallIdRequest>,
) -> Result<Json<ApiResponse<CallJoin>>, ApiError> {
    let join = state.calls.join(&auth, req.call_id).await?;
    Ok(Json(ApiResponse::ok(join)))
}

/// POST /api/calls/leave
pub async fn leave_call(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CallIdRequest>,
) -> Result<Json<ApiResponse<LeaveCallResponse>>, ApiError> {
    let response = match state.calls.leave(&auth, req.call_id).await? {
        LeaveOutcome::Left => LeaveCallResponse {
            outcome: "left".to_string(),
            duration_seconds: None,
        },
        LeaveOutcome::Ended(info) => LeaveCallResponse {
            outcome: "ended".to_string(),
            duration_seconds: Some(info.duration_seconds),
        },
        LeaveOutcome::AlreadyEnded => LeaveCallResponse {
            outcome: "already_ended".to_string(),
            duration_seconds: None,
        },
    };
    Ok(Json(ApiResponse::ok(response)))
}

/// POST /api/calls/end
pub async fn end_call(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CallIdRequest>,
) -> Result<Json<ApiResponse<Option<CallEndInfo>>>, ApiError> {
    let info = state.calls.end(&auth, req.call_id).await?;
    Ok(Json(ApiResponse::ok(info)))
}

/// GET /api/conversations/{id}/call
pub async fn active_call(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Option<ActiveCallInfo>>>, ApiError> {
    let call = state.calls.active_call(&auth, conversation_id).await?;
    Ok(Json(ApiResponse::ok(call)))
}
