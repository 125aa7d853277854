//! WebSocket frame types, event payloads, and the event envelope.

pub mod envelope;
pub mod events;
pub mod types;

pub use envelope::EventEnvelope;
pub use events::*;
pub use types::{EventType, InboundMessage, OutboundMessage};
