//! Response DTOs.

use serde::{Deserialize, Serialize};

use murmur_realtime::metrics::MetricsSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Acknowledgement for operations without a result body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// What happened.
    pub message: String,
}

impl MessageResponse {
    /// Wrap a short acknowledgement.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of leaving a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveCallResponse {
    /// `left`, `ended`, or `already_ended`.
    pub outcome: String,
    /// Call length when this leave ended it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
}

/// Health check.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `ok` when the process answers.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// `ok` for a reachable Postgres backend, `memory` for the in-memory one.
    pub database: String,
    /// Users with at least one live connection.
    pub online_users: usize,
    /// Real-time counters.
    pub realtime: MetricsSnapshot,
}
