//! # murmur-realtime
//!
//! The realtime core for Murmur:
//!
//! - **Presence**: per-user live connection counts and online/offline edges
//! - **Channels**: the canonical per-user channel and its authorization
//! - **Pub/sub**: the publish/subscribe substrate seam and its in-memory implementation
//! - **Publisher**: typed `{type, data}` envelopes fanned out to user channels
//! - **Ready**: the one-time initial snapshot sent on subscription
//! - **Engine**: connection lifecycle, READY delivery, and background task tracking

pub mod channel;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod publisher;
pub mod pubsub;
pub mod ready;
pub mod server;

pub use channel::{ChannelAuthorizer, ChannelType};
pub use message::{EventEnvelope, EventType};
pub use presence::{PresenceNotifier, PresenceTracker};
pub use publisher::EventPublisher;
pub use pubsub::{MemoryPubSub, PubSub};
pub use ready::ReadyAggregator;
pub use server::{ReadyTicket, RealtimeEngine};
