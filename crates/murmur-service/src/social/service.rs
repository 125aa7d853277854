//! Friend service.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use murmur_core::error::AppError;
use murmur_core::result::AppResult;
use murmur_database::store::{SocialGraphStore, UserStore};
use murmur_entity::friendship::{
    Block, BlockWithUser, FriendRequest, FriendRequestStatus, FriendRequestWithUser, FriendWithUser,
};
use murmur_realtime::message::{
    FriendRequestCreate, FriendRequestDelete, RelationshipAdd, RelationshipRemove,
};
use murmur_realtime::{EventPublisher, EventType};

use crate::context::RequestContext;

/// Manages friend requests, friendships, and blocks and notifies both sides.
#[derive(Clone)]
pub struct FriendService {
    social: Arc<dyn SocialGraphStore>,
    users: Arc<dyn UserStore>,
    publisher: EventPublisher,
}

impl std::fmt::Debug for FriendService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FriendService").finish()
    }
}

impl FriendService {
    /// Creates a new friend service.
    pub fn new(
        social: Arc<dyn SocialGraphStore>,
        users: Arc<dyn UserStore>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            social,
            users,
            publisher,
        }
    }

    /// The caller's friends.
    pub async fn friends(&self, ctx: &RequestContext) -> AppResult<Vec<FriendWithUser>> {
        self.social.friends(ctx.user_id).await
    }

    /// Pending requests addressed to the caller, newest first.
    pub async fn incoming_requests(&self, ctx: &RequestContext) -> AppResult<Vec<FriendRequestWithUser>> {
        self.social.incoming_requests(ctx.user_id).await
    }

    /// Pending requests the caller sent, newest first.
    pub async fn outgoing_requests(&self, ctx: &RequestContext) -> AppResult<Vec<FriendRequestWithUser>> {
        self.social.outgoing_requests(ctx.user_id).await
    }

    /// Send a friend request addressed by username.
    pub async fn send_request_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> AppResult<FriendRequest> {
        let target = self
            .users
            .find_user_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        self.send_request(ctx, target.id).await
    }

    /// Send a friend request.
    ///
    /// When the target already asked the caller, the two become friends
    /// immediately and both receive `RELATIONSHIP_ADD`; otherwise the target
    /// receives `FRIEND_REQUEST_CREATE`.
    pub async fn send_request(&self, ctx: &RequestContext, to_user_id: Uuid) -> AppResult<FriendRequest> {
        if to_user_id == ctx.user_id {
            return Err(AppError::validation("Cannot send a friend request to yourself"));
        }
        if self.users.find_user(to_user_id).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }

        let request = self.social.send_request(ctx.user_id, to_user_id).await?;
        if request.status == FriendRequestStatus::Accepted {
            info!(user_id = %ctx.user_id, friend_id = %to_user_id, "Reciprocal request accepted");
            self.announce_friendship(ctx.user_id, to_user_id).await;
        } else {
            info!(from = %ctx.user_id, to = %to_user_id, request_id = %request.id, "Friend request sent");
            match self.social.request_with_user(request.id, to_user_id).await {
                Ok(Some(view)) => {
                    self.notify(to_user_id, EventType::FriendRequestCreate, &FriendRequestCreate { request: view })
                        .await;
                }
                Ok(None) => {}
                Err(e) => warn!(request_id = %request.id, error = %e, "Failed to load request for notification"),
            }
        }
        Ok(request)
    }

    /// Accept a request addressed to the caller.
    pub async fn accept_request(&self, ctx: &RequestContext, request_id: Uuid) -> AppResult<FriendRequest> {
        let request = self.social.accept_request(ctx.user_id, request_id).await?;
        info!(request_id = %request_id, user_id = %ctx.user_id, "Friend request accepted");

        self.announce_friendship(request.from_user_id, ctx.user_id).await;
        let deleted = FriendRequestDelete {
            request_id,
            user_id: ctx.user_id,
        };
        self.notify(request.from_user_id, EventType::FriendRequestDelete, &deleted)
            .await;
        Ok(request)
    }

    /// Decline a request addressed to the caller.
    pub async fn decline_request(&self, ctx: &RequestContext, request_id: Uuid) -> AppResult<()> {
        let request = self.social.decline_request(ctx.user_id, request_id).await?;
        info!(request_id = %request_id, user_id = %ctx.user_id, "Friend request declined");

        let deleted = FriendRequestDelete {
            request_id,
            user_id: ctx.user_id,
        };
        self.notify(request.from_user_id, EventType::FriendRequestDelete, &deleted)
            .await;
        Ok(())
    }

    /// Withdraw a request the caller sent.
    pub async fn cancel_request(&self, ctx: &RequestContext, request_id: Uuid) -> AppResult<()> {
        let request = self.social.cancel_request(ctx.user_id, request_id).await?;
        info!(request_id = %request_id, user_id = %ctx.user_id, "Friend request cancelled");

        let deleted = FriendRequestDelete {
            request_id,
            user_id: ctx.user_id,
        };
        self.notify(request.to_user_id, EventType::FriendRequestDelete, &deleted)
            .await;
        Ok(())
    }

    /// End a friendship.
    pub async fn remove_friend(&self, ctx: &RequestContext, friend_id: Uuid) -> AppResult<()> {
        self.social.remove_friend(ctx.user_id, friend_id).await?;
        info!(user_id = %ctx.user_id, friend_id = %friend_id, "Friend removed");

        self.notify(ctx.user_id, EventType::RelationshipRemove, &RelationshipRemove { user_id: friend_id })
            .await;
        self.notify(friend_id, EventType::RelationshipRemove, &RelationshipRemove { user_id: ctx.user_id })
            .await;
        Ok(())
    }

    /// Block a user. Any friendship or pending request between the two is
    /// dropped: a friendship sends both sides `RELATIONSHIP_REMOVE`, a
    /// pending request sends both sides `FRIEND_REQUEST_DELETE`.
    pub async fn block_user(&self, ctx: &RequestContext, user_id: Uuid) -> AppResult<Block> {
        if user_id == ctx.user_id {
            return Err(AppError::validation("Cannot block yourself"));
        }
        let (block, removed) = self.social.block_user(ctx.user_id, user_id).await?;
        info!(blocker_id = %ctx.user_id, blocked_id = %user_id, dropped = removed.len(), "User blocked");

        for request in removed {
            match request.status {
                FriendRequestStatus::Accepted => {
                    self.notify(ctx.user_id, EventType::RelationshipRemove, &RelationshipRemove { user_id })
                        .await;
                    self.notify(user_id, EventType::RelationshipRemove, &RelationshipRemove { user_id: ctx.user_id })
                        .await;
                }
                FriendRequestStatus::Pending => {
                    for side in [request.from_user_id, request.to_user_id] {
                        let deleted = FriendRequestDelete {
                            request_id: request.id,
                            user_id: request.counterpart(side),
                        };
                        self.notify(side, EventType::FriendRequestDelete, &deleted).await;
                    }
                }
                FriendRequestStatus::Declined => {}
            }
        }
        Ok(block)
    }

    /// Lift a block the caller placed.
    pub async fn unblock_user(&self, ctx: &RequestContext, user_id: Uuid) -> AppResult<()> {
        self.social.unblock_user(ctx.user_id, user_id).await?;
        info!(blocker_id = %ctx.user_id, blocked_id = %user_id, "User unblocked");
        Ok(())
    }

    /// Users the caller blocks, newest first.
    pub async fn blocks(&self, ctx: &RequestContext) -> AppResult<Vec<BlockWithUser>> {
        self.social.blocked_users(ctx.user_id).await
    }

    /// Send each side `RELATIONSHIP_ADD` carrying the other side's profile.
    async fn announce_friendship(&self, a: Uuid, b: Uuid) {
        for (viewer, other) in [(a, b), (b, a)] {
            match self.social.find_friend(viewer, other).await {
                Ok(Some(friend)) => {
                    self.notify(viewer, EventType::RelationshipAdd, &RelationshipAdd { friend })
                        .await;
                }
                Ok(None) => warn!(user_id = %viewer, friend_id = %other, "Friendship missing after accept"),
                Err(e) => warn!(user_id = %viewer, error = %e, "Failed to load friend for notification"),
            }
        }
    }

    async fn notify<T>(&self, user_id: Uuid, event_type: EventType, data: &T)
    where
        T: serde::Serialize + Sync,
    {
        if let Err(e) = self.publisher.publish_to_user(user_id, event_type, data).await {
            warn!(user_id = %user_id, event = %event_type, error = %e, "Failed to notify user");
        }
    }
}
