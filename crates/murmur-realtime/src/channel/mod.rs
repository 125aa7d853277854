//! Channel naming and authorization.

pub mod authorizer;
pub mod types;

pub use authorizer::ChannelAuthorizer;
pub use types::ChannelType;
