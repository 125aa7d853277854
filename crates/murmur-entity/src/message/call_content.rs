//! Body of a call system message.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a finished call is presented in the conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallOutcome {
    /// Nobody answered.
    Missed,
    /// At least one other person joined, or the call ran long enough.
    Completed,
}

/// JSON content stored in a [`super::MessageKind::Call`] message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallMessageContent {
    /// The ended call.
    pub call_id: Uuid,
    /// Duration in whole seconds.
    pub duration: i64,
    /// Every user that ever joined the call.
    pub participants: Vec<Uuid>,
    /// Missed or completed.
    pub status: CallOutcome,
}

impl CallMessageContent {
    /// Encode as the message body.
    pub fn to_json(&self) -> Result<String, murmur_core::AppError> {
        Ok(serde_json::to_string(self)?)
    }
}
