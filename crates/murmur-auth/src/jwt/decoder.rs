//! JWT access-token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use murmur_core::config::AuthConfig;
use murmur_core::error::AppError;

use super::claims::Claims;

/// Validates HS256 access tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = config.leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::ImmatureSignature => {
                        AppError::authentication("Token is not yet valid")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    _ => AppError::authentication(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtEncoder;
    use murmur_core::ErrorKind;
    use uuid::Uuid;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn round_trips_user_id() {
        let cfg = config("test-secret");
        let user_id = Uuid::new_v4();
        let (token, _) = JwtEncoder::new(&cfg).generate_access_token(user_id).unwrap();

        let claims = JwtDecoder::new(&cfg).decode_access_token(&token).unwrap();
        assert_eq!(claims.user_id(), user_id);
    }

    #[test]
    fn rejects_foreign_signature() {
        let (token, _) = JwtEncoder::new(&config("one"))
            .generate_access_token(Uuid::new_v4())
            .unwrap();

        let err = JwtDecoder::new(&config("two"))
            .decode_access_token(&token)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[test]
    fn rejects_expired_token() {
        let cfg = AuthConfig {
            jwt_access_ttl_minutes: 0,
            leeway_seconds: 0,
            ..config("test-secret")
        };
        let (token, _) = JwtEncoder::new(&cfg)
            .generate_access_token(Uuid::new_v4())
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));

        let err = JwtDecoder::new(&cfg).decode_access_token(&token).unwrap_err();
        assert_eq!(err.message, "Token has expired");
    }

    #[test]
    fn rejects_garbage() {
        let err = JwtDecoder::new(&config("s"))
            .decode_access_token("not-a-jwt")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }
}
