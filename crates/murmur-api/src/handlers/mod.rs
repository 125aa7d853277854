//! HTTP and WebSocket handlers.

pub mod calls;
pub mod conversations;
pub mod friends;
pub mod health;
pub mod messages;
pub mod ws;
