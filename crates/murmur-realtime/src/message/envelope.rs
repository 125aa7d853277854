//! The `{type, data}` envelope every published event is wrapped in.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use murmur_core::error::AppError;

use super::types::EventType;

/// Envelope wrapping an event payload with its discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    /// Event discriminator
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Event payload
    pub data: T,
}

impl<T: Serialize> EventEnvelope<T> {
    /// Wrap a payload
    pub fn new(event_type: EventType, data: T) -> Self {
        Self { event_type, data }
    }

    /// Serialize into the shared publication buffer
    pub fn encode(&self) -> Result<Arc<str>, AppError> {
        Ok(Arc::from(serde_json::to_string(self)?))
    }
}

impl EventEnvelope<serde_json::Value> {
    /// Parse a publication back into an untyped envelope
    pub fn decode(payload: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_has_exactly_two_fields() {
        let payload = json!({"user_id": "abc", "status": "online"});
        let encoded = EventEnvelope::new(EventType::PresenceUpdate, &payload)
            .encode()
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["type"], "PRESENCE_UPDATE");
        assert_eq!(object["data"], payload);
    }

    #[test]
    fn decode_preserves_payload() {
        let payload = json!({"nested": {"list": [1, 2, 3]}, "text": "héllo"});
        let encoded = EventEnvelope::new(EventType::MessageCreate, &payload)
            .encode()
            .unwrap();

        let decoded = EventEnvelope::decode(&encoded).unwrap();
        assert_eq!(decoded.event_type, EventType::MessageCreate);
        assert_eq!(decoded.data, payload);
    }
}
