//! Media-session (SFU) join credentials.

pub mod token;

pub use token::{MediaClaims, MediaGrant, MediaTokenIssuer, VideoGrant};
