//! # murmur-auth
//!
//! The identity collaborator: HS256 access tokens resolved to user ids,
//! plus the media-session provider that mints short-lived room join
//! credentials.

pub mod jwt;
pub mod media;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use media::{MediaGrant, MediaTokenIssuer};
