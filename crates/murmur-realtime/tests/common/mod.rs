#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use murmur_core::error::AppError;
use murmur_core::result::AppResult;
use murmur_database::MemoryStore;
use murmur_database::store::SocialGraphStore;
use murmur_entity::friendship::{
    Block, BlockWithUser, FriendRequest, FriendRequestWithUser, FriendWithUser,
};

/// A social graph whose every lookup fails.
pub struct DownSocialGraph;

fn down<T>() -> AppResult<T> {
    Err(AppError::database("social graph unavailable"))
}

#[async_trait]
impl SocialGraphStore for DownSocialGraph {
    async fn friend_ids(&self, _: Uuid) -> AppResult<Vec<Uuid>> {
        down()
    }
    async fn friends(&self, _: Uuid) -> AppResult<Vec<FriendWithUser>> {
        down()
    }
    async fn incoming_requests(&self, _: Uuid) -> AppResult<Vec<FriendRequestWithUser>> {
        down()
    }
    async fn outgoing_requests(&self, _: Uuid) -> AppResult<Vec<FriendRequestWithUser>> {
        down()
    }
    async fn find_request(&self, _: Uuid) -> AppResult<Option<FriendRequest>> {
        down()
    }
    async fn request_with_user(&self, _: Uuid, _: Uuid) -> AppResult<Option<FriendRequestWithUser>> {
        down()
    }
    async fn find_friend(&self, _: Uuid, _: Uuid) -> AppResult<Option<FriendWithUser>> {
        down()
    }
    async fn send_request(&self, _: Uuid, _: Uuid) -> AppResult<FriendRequest> {
        down()
    }
    async fn accept_request(&self, _: Uuid, _: Uuid) -> AppResult<FriendRequest> {
        down()
    }
    async fn decline_request(&self, _: Uuid, _: Uuid) -> AppResult<FriendRequest> {
        down()
    }
    async fn cancel_request(&self, _: Uuid, _: Uuid) -> AppResult<FriendRequest> {
        down()
    }
    async fn remove_friend(&self, _: Uuid, _: Uuid) -> AppResult<()> {
        down()
    }
    async fn block_user(&self, _: Uuid, _: Uuid) -> AppResult<(Block, Vec<FriendRequest>)> {
        down()
    }
    async fn unblock_user(&self, _: Uuid, _: Uuid) -> AppResult<()> {
        down()
    }
    async fn blocked_users(&self, _: Uuid) -> AppResult<Vec<BlockWithUser>> {
        down()
    }
    async fn is_blocked(&self, _: Uuid, _: Uuid) -> AppResult<bool> {
        down()
    }
}

/// The in-memory social graph, except that the first friend lookup stalls.
pub struct SlowFirstFriends {
    inner: MemoryStore,
    stalled: AtomicBool,
    delay: Duration,
}

impl SlowFirstFriends {
    pub fn new(inner: MemoryStore, delay: Duration) -> Self {
        Self {
            inner,
            stalled: AtomicBool::new(false),
            delay,
        }
    }
}

#[async_trait]
impl SocialGraphStore for SlowFirstFriends {
    async fn friend_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        // Read before stalling so the late answer is the stale one.
        let ids = self.inner.friend_ids(user_id).await;
        if !self.stalled.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(self.delay).await;
        }
        ids
    }
    async fn friends(&self, user_id: Uuid) -> AppResult<Vec<FriendWithUser>> {
        self.inner.friends(user_id).await
    }
    async fn incoming_requests(&self, user_id: Uuid) -> AppResult<Vec<FriendRequestWithUser>> {
        self.inner.incoming_requests(user_id).await
    }
    async fn outgoing_requests(&self, user_id: Uuid) -> AppResult<Vec<FriendRequestWithUser>> {
        self.inner.outgoing_requests(user_id).await
    }
    async fn find_request(&self, request_id: Uuid) -> AppResult<Option<FriendRequest>> {
        self.inner.find_request(request_id).await
    }
    async fn request_with_user(&self, request_id: Uuid, viewer_id: Uuid) -> AppResult<Option<FriendRequestWithUser>> {
        self.inner.request_with_user(request_id, viewer_id).await
    }
    async fn find_friend(&self, user_id: Uuid, friend_id: Uuid) -> AppResult<Option<FriendWithUser>> {
        self.inner.find_friend(user_id, friend_id).await
    }
    async fn send_request(&self, from: Uuid, to: Uuid) -> AppResult<FriendRequest> {
        self.inner.send_request(from, to).await
    }
    async fn accept_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<FriendRequest> {
        self.inner.accept_request(user_id, request_id).await
    }
    async fn decline_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<FriendRequest> {
        self.inner.decline_request(user_id, request_id).await
    }
    async fn cancel_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<FriendRequest> {
        self.inner.cancel_request(user_id, request_id).await
    }
    async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> AppResult<()> {
        self.inner.remove_friend(user_id, friend_id).await
    }
    async fn block_user(&self, blocker_id: Uuid, blocked_id: Uuid) -> AppResult<(Block, Vec<FriendRequest>)> {
        self.inner.block_user(blocker_id, blocked_id).await
    }
    async fn unblock_user(&self, blocker_id: Uuid, blocked_id: Uuid) -> AppResult<()> {
        self.inner.unblock_user(blocker_id, blocked_id).await
    }
    async fn blocked_users(&self, blocker_id: Uuid) -> AppResult<Vec<BlockWithUser>> {
        self.inner.blocked_users(blocker_id).await
    }
    async fn is_blocked(&self, a: Uuid, b: Uuid) -> AppResult<bool> {
        self.inner.is_blocked(a, b).await
    }
}
