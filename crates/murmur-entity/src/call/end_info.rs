//! Summary produced when a call ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::Call;
use crate::message::{CallMessageContent, CallOutcome};

/// Produced exactly once, by whoever moved the call from active to ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEndInfo {
    /// The ended call.
    pub call_id: Uuid,
    /// Owning conversation.
    pub conversation_id: Uuid,
    /// User who started the call.
    pub started_by: Uuid,
    /// Every distinct user that ever joined.
    pub participants: Vec<Uuid>,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// End time.
    pub ended_at: DateTime<Utc>,
    /// `ended_at - started_at` in whole seconds.
    pub duration_seconds: i64,
}

impl CallEndInfo {
    /// Build the summary for an ended call. Returns `None` while the call
    /// is still active.
    pub fn from_call(call: &Call, participants: Vec<Uuid>) -> Option<Self> {
        let ended_at = call.ended_at?;
        Some(Self {
            call_id: call.id,
            conversation_id: call.conversation_id,
            started_by: call.started_by,
            participants,
            started_at: call.started_at,
            ended_at,
            duration_seconds: call.duration_seconds().unwrap_or(0),
        })
    }

    /// Heuristic classification: a call nobody else ever joined that lasted
    /// less than `missed_threshold_seconds` is shown as missed.
    pub fn outcome(&self, missed_threshold_seconds: i64) -> CallOutcome {
        if self.participants.len() == 1 && self.duration_seconds < missed_threshold_seconds {
            CallOutcome::Missed
        } else {
            CallOutcome::Completed
        }
    }

    /// Content of the system message announcing this call.
    pub fn message_content(&self, missed_threshold_seconds: i64) -> CallMessageContent {
        CallMessageContent {
            call_id: self.call_id,
            duration: self.duration_seconds,
            participants: self.participants.clone(),
            status: self.outcome(missed_threshold_seconds),
        }
    }
}
