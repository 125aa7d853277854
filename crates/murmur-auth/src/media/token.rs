//! Short-lived room join tokens for the media server.
//!
//! Stateless: a token is derived from the room name and the user's
//! identity and signed with the media server's API secret.

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use murmur_core::config::CallsConfig;
use murmur_core::error::{AppError, ErrorKind};

/// Room permissions embedded in a join token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    /// Permission to join the room.
    pub room_join: bool,
    /// Room the grant applies to.
    pub room: String,
}

/// Claims understood by the media server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaClaims {
    /// API key of the issuing backend.
    pub iss: String,
    /// Participant identity (the user id).
    pub sub: String,
    /// Display name shown to other participants.
    pub name: String,
    /// Not valid before (seconds since epoch).
    pub nbf: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
    /// Room permissions.
    pub video: VideoGrant,
}

/// A signed join credential and where to use it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaGrant {
    /// Signed JWT.
    pub token: String,
    /// Media server URL.
    pub url: String,
    /// Room the token admits the bearer to.
    pub room: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
}

/// Mints join tokens for call rooms.
#[derive(Clone)]
pub struct MediaTokenIssuer {
    api_key: String,
    encoding_key: EncodingKey,
    url: String,
    room_prefix: String,
    ttl_hours: i64,
}

impl std::fmt::Debug for MediaTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaTokenIssuer")
            .field("url", &self.url)
            .field("room_prefix", &self.room_prefix)
            .field("ttl_hours", &self.ttl_hours)
            .finish_non_exhaustive()
    }
}

impl MediaTokenIssuer {
    /// Creates an issuer from call configuration.
    pub fn new(config: &CallsConfig) -> Self {
        Self {
            api_key: config.media_api_key.clone(),
            encoding_key: EncodingKey::from_secret(config.media_api_secret.as_bytes()),
            url: config.media_url.clone(),
            room_prefix: config.room_prefix.clone(),
            ttl_hours: config.media_token_ttl_hours as i64,
        }
    }

    /// Room name used for a call.
    pub fn room_for_call(&self, call_id: Uuid) -> String {
        format!("{}{}", self.room_prefix, call_id)
    }

    /// Issue a join token for `user_id` in the room belonging to `call_id`.
    pub fn issue(&self, call_id: Uuid, user_id: Uuid, display_name: &str) -> Result<MediaGrant, AppError> {
        let room = self.room_for_call(call_id);
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.ttl_hours);
        let claims = MediaClaims {
            iss: self.api_key.clone(),
            sub: user_id.to_string(),
            name: display_name.to_string(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            video: VideoGrant {
                room_join: true,
                room: room.clone(),
            },
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            AppError::with_source(ErrorKind::ExternalService, "Failed to sign media token", e)
        })?;

        debug!(call_id = %call_id, user_id = %user_id, room = %room, "Issued media join token");
        Ok(MediaGrant {
            token,
            url: self.url.clone(),
            room,
            expires_at,
        })
    }
}
