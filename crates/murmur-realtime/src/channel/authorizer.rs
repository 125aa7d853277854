//! Connection and subscription authorization.

use std::sync::Arc;

use uuid::Uuid;

use murmur_auth::JwtDecoder;
use murmur_core::error::AppError;

use super::types::ChannelType;

/// Runs the two independent checks every client passes: the handshake
/// (token → user id) and each subscribe request (user id → own channel only).
#[derive(Clone)]
pub struct ChannelAuthorizer {
    /// JWT decoder.
    decoder: Arc<JwtDecoder>,
}

impl std::fmt::Debug for ChannelAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelAuthorizer").finish()
    }
}

impl ChannelAuthorizer {
    /// Creates a new authorizer.
    pub fn new(decoder: Arc<JwtDecoder>) -> Self {
        Self { decoder }
    }

    /// Resolves a bearer token to the connecting user's id.
    pub fn authenticate(&self, token: &str) -> Result<Uuid, AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::authentication("Missing token"));
        }
        let claims = self.decoder.decode_access_token(token)?;
        Ok(claims.user_id())
    }

    /// Allows a subscription only to the user's own channel.
    pub fn authorize_subscribe(&self, user_id: Uuid, channel: &str) -> Result<(), AppError> {
        if channel == ChannelType::user_channel(user_id) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "Not allowed to subscribe to '{channel}'"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use murmur_auth::JwtEncoder;
    use murmur_core::config::AuthConfig;
    use murmur_core::error::ErrorKind;

    use super::*;

    fn setup() -> (JwtEncoder, ChannelAuthorizer) {
        let config = AuthConfig::default();
        (
            JwtEncoder::new(&config),
            ChannelAuthorizer::new(Arc::new(JwtDecoder::new(&config))),
        )
    }

    #[test]
    fn valid_token_resolves_user() {
        let (encoder, authorizer) = setup();
        let user = Uuid::new_v4();
        let (token, _) = encoder.generate_access_token(user).unwrap();

        assert_eq!(authorizer.authenticate(&token).unwrap(), user);
    }

    #[test]
    fn garbage_and_empty_tokens_fail_authentication() {
        let (_, authorizer) = setup();

        let err = authorizer.authenticate("not.a.jwt").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        let err = authorizer.authenticate("  ").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[test]
    fn only_own_channel_is_allowed() {
        let (_, authorizer) = setup();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(authorizer
            .authorize_subscribe(user, &format!("user:{user}"))
            .is_ok());
        let err = authorizer
            .authorize_subscribe(user, &format!("user:{other}"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        let err = authorizer
            .authorize_subscribe(user, &format!("user:{}", user.simple()))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }
}
