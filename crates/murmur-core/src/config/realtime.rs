//! Real-time engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Buffer size of each per-channel broadcast queue.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// How long a pending READY waits for the subscriber to confirm it is
    /// listening before being dropped, in milliseconds.
    #[serde(default = "default_ready_confirm_timeout")]
    pub ready_confirm_timeout_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            ready_confirm_timeout_ms: default_ready_confirm_timeout(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_ready_confirm_timeout() -> u64 {
    2000
}
