//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/health
///
/// Answers 503 when the Postgres backend does not respond.
pub async fn health(State(state): State<AppState>) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    let database = match &state.database {
        Some(pool) => {
            pool.ping().await?;
            "ok"
        }
        None => "memory",
    };

    Ok(Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        online_users: state.realtime.presence.online_count(),
        realtime: state.realtime.metrics.snapshot(),
    })))
}
