//! Call session and media server configuration.

use serde::{Deserialize, Serialize};

/// Settings for call sessions and the media (SFU) collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallsConfig {
    /// Public URL clients use to reach the media server.
    #[serde(default = "default_media_url")]
    pub media_url: String,
    /// API key placed in the `iss` claim of join tokens.
    #[serde(default = "default_media_api_key")]
    pub media_api_key: String,
    /// Secret used to sign media join tokens.
    #[serde(default = "default_media_secret")]
    pub media_api_secret: String,
    /// Lifetime of a media join token, in hours.
    #[serde(default = "default_media_ttl")]
    pub media_token_ttl_hours: u64,
    /// Prefix applied to a call id to form its media room name.
    #[serde(default = "default_room_prefix")]
    pub room_prefix: String,
    /// Calls shorter than this with a single participant are classified as missed.
    #[serde(default = "default_missed_threshold")]
    pub missed_call_threshold_seconds: i64,
}

impl Default for CallsConfig {
    fn default() -> Self {
        Self {
            media_url: default_media_url(),
            media_api_key: default_media_api_key(),
            media_api_secret: default_media_secret(),
            media_token_ttl_hours: default_media_ttl(),
            room_prefix: default_room_prefix(),
            missed_call_threshold_seconds: default_missed_threshold(),
        }
    }
}

fn default_media_url() -> String {
    "ws://localhost:7880".to_string()
}

fn default_media_api_key() -> String {
    "devkey".to_string()
}

fn default_media_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_media_ttl() -> u64 {
    24
}

fn default_room_prefix() -> String {
    "call-".to_string()
}

fn default_missed_threshold() -> i64 {
    5
}
