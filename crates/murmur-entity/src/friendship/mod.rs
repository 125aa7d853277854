//! Friend requests, friendships, and blocks.

pub mod model;
pub mod status;

pub use model::{Block, BlockWithUser, FriendRequest, FriendRequestWithUser, FriendWithUser};
pub use status::FriendRequestStatus;
