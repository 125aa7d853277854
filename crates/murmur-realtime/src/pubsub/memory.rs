//! In-memory pub/sub for single-node deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::sync::broadcast;
use tracing::trace;

use murmur_core::result::AppResult;

use super::{PubSub, Publication};

/// In-memory pub/sub implementation.
#[derive(Debug)]
pub struct MemoryPubSub {
    /// Channel name → broadcast sender
    channels: RwLock<HashMap<String, broadcast::Sender<Publication>>>,
    /// Buffer size for channels
    buffer_size: usize,
}

impl MemoryPubSub {
    /// Create a new in-memory pub/sub
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Number of channels with a registered sender
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

#[async_trait]
impl PubSub for MemoryPubSub {
    async fn publish(&self, channel: &str, payload: Publication) -> AppResult<()> {
        let channels = self.channels.read().await;
        match channels.get(channel) {
            Some(tx) => {
                // Err only means every receiver is gone.
                let delivered = tx.send(payload).unwrap_or(0);
                trace!(channel, delivered, "Published");
            }
            None => trace!(channel, "Published to channel without listeners"),
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> AppResult<broadcast::Receiver<Publication>> {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer_size).0);
        Ok(tx.subscribe())
    }

    async fn release(&self, channel: &str) {
        let mut channels = self.channels.write().await;
        if channels
            .get(channel)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            channels.remove(channel);
        }
    }
}
