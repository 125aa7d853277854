//! Friend requests and friendships.

pub mod service;

pub use service::FriendService;
