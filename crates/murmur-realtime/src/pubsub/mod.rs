//! The publish/subscribe substrate the core publishes through.
//!
//! The substrate only moves opaque text between named channels. Channel
//! naming, envelopes, and authorization live above it.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use murmur_core::result::AppResult;

pub use memory::MemoryPubSub;

/// A publication as it travels through the substrate.
pub type Publication = Arc<str>;

/// Publish JSON text to a named channel and listen on channels.
#[async_trait]
pub trait PubSub: Send + Sync + std::fmt::Debug {
    /// Deliver `payload` to every current listener of `channel`.
    ///
    /// A channel without listeners is not an error; the publication is
    /// simply not delivered.
    async fn publish(&self, channel: &str, payload: Publication) -> AppResult<()>;

    /// Start listening on `channel`.
    async fn subscribe(&self, channel: &str) -> AppResult<broadcast::Receiver<Publication>>;

    /// Forget `channel` if nobody listens to it any more.
    async fn release(&self, channel: &str);
}
