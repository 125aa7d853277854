//! Call service: state machine transitions plus their announcements.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use murmur_auth::MediaTokenIssuer;
use murmur_core::config::CallsConfig;
use murmur_core::error::AppError;
use murmur_core::result::AppResult;
use murmur_database::store::{CallStore, ConversationStore, MessageStore, UserStore};
use murmur_entity::call::CallEndInfo;
use murmur_entity::message::MessageKind;
use murmur_realtime::message::{ActiveCallInfo, CallState, MessageCreate};
use murmur_realtime::{EventPublisher, EventType};

use super::machine::{CallStateMachine, LeaveOutcome};
use crate::context::RequestContext;
use crate::fanout::ConversationFanout;

/// What a client needs to enter the media room of a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallJoin {
    /// The call.
    pub call_id: Uuid,
    /// `true` when this request started the call.
    pub started: bool,
    /// Media room join token.
    pub token: String,
    /// Media server URL.
    pub media_url: String,
}

/// Starts, joins, leaves, and ends calls, keeping every conversation
/// participant's view of the call current.
#[derive(Clone)]
pub struct CallService {
    machine: CallStateMachine,
    calls: Arc<dyn CallStore>,
    users: Arc<dyn UserStore>,
    messages: Arc<dyn MessageStore>,
    conversations: Arc<dyn ConversationStore>,
    fanout: ConversationFanout,
    media: Arc<MediaTokenIssuer>,
    missed_threshold_seconds: i64,
}

impl std::fmt::Debug for CallService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallService")
            .field("missed_threshold_seconds", &self.missed_threshold_seconds)
            .finish_non_exhaustive()
    }
}

impl CallService {
    /// Creates a new call service.
    pub fn new(
        calls: Arc<dyn CallStore>,
        users: Arc<dyn UserStore>,
        messages: Arc<dyn MessageStore>,
        conversations: Arc<dyn ConversationStore>,
        publisher: EventPublisher,
        media: Arc<MediaTokenIssuer>,
        config: &CallsConfig,
    ) -> Self {
        Self {
            machine: CallStateMachine::new(calls.clone(), conversations.clone()),
            calls,
            users,
            messages,
            fanout: ConversationFanout::new(conversations.clone(), publisher),
            conversations,
            media,
            missed_threshold_seconds: config.missed_call_threshold_seconds,
        }
    }

    /// Start the conversation's call or join the running one.
    pub async fn start_or_join(&self, ctx: &RequestContext, conversation_id: Uuid) -> AppResult<CallJoin> {
        let entry = self
            .machine
            .start_or_join(conversation_id, ctx.user_id, Utc::now())
            .await?;
        self.broadcast_state(conversation_id).await;
        self.grant(entry.call.id, ctx.user_id, entry.started).await
    }

    /// Join a specific call.
    pub async fn join(&self, ctx: &RequestContext, call_id: Uuid) -> AppResult<CallJoin> {
        let entry = self.machine.join(call_id, ctx.user_id, Utc::now()).await?;
        self.broadcast_state(entry.call.conversation_id).await;
        self.grant(entry.call.id, ctx.user_id, false).await
    }

    /// Leave a call. The last leave ends it and posts the call message.
    pub async fn leave(&self, ctx: &RequestContext, call_id: Uuid) -> AppResult<LeaveOutcome> {
        let (call, outcome) = self.machine.leave(call_id, ctx.user_id, Utc::now()).await?;
        if let LeaveOutcome::Ended(info) = &outcome {
            self.announce_end(info).await;
        }
        self.broadcast_state(call.conversation_id).await;
        Ok(outcome)
    }

    /// End a call for everyone. Returns `None` when it had already ended.
    pub async fn end(&self, ctx: &RequestContext, call_id: Uuid) -> AppResult<Option<CallEndInfo>> {
        let call = self
            .calls
            .find_call(call_id)
            .await?
            .ok_or_else(|| AppError::not_found("Call not found"))?;
        self.require_participant(call.conversation_id, ctx.user_id)
            .await?;

        let (call, info) = self.machine.end(call_id, Utc::now()).await?;
        if let Some(info) = &info {
            self.announce_end(info).await;
        }
        self.broadcast_state(call.conversation_id).await;
        Ok(info)
    }

    /// The conversation's active call, if any.
    pub async fn active_call(
        &self,
        ctx: &RequestContext,
        conversation_id: Uuid,
    ) -> AppResult<Option<ActiveCallInfo>> {
        self.require_participant(conversation_id, ctx.user_id)
            .await?;
        let Some(call) = self.calls.find_active_for_conversation(conversation_id).await? else {
            return Ok(None);
        };
        let participants = self.calls.active_participants(call.id).await?;
        Ok(Some(ActiveCallInfo {
            call_id: call.id,
            conversation_id,
            participants,
            started_at: call.started_at,
        }))
    }

    /// Publish the conversation's current call snapshot to all of its
    /// participants. Safe to repeat.
    pub async fn broadcast_state(&self, conversation_id: Uuid) {
        let state = match self.calls.find_active_for_conversation(conversation_id).await {
            Ok(Some(call)) => {
                let participants = self
                    .calls
                    .active_participants(call.id)
                    .await
                    .unwrap_or_else(|e| {
                        warn!(call_id = %call.id, error = %e, "Failed to load call participants");
                        Vec::new()
                    });
                CallState {
                    conversation_id,
                    call_id: Some(call.id),
                    participants,
                }
            }
            Ok(None) => CallState::idle(conversation_id),
            Err(e) => {
                warn!(conversation_id = %conversation_id, error = %e, "Failed to load call state");
                return;
            }
        };
        self.fanout
            .to_participants(conversation_id, EventType::CallState, &state)
            .await;
    }

    /// Post the call system message and fan it out.
    async fn announce_end(&self, info: &CallEndInfo) {
        let content = info.message_content(self.missed_threshold_seconds);
        let body = match content.to_json() {
            Ok(body) => body,
            Err(e) => {
                error!(call_id = %info.call_id, error = %e, "Failed to encode call message");
                return;
            }
        };

        let message = match self
            .messages
            .create_message(info.conversation_id, info.started_by, &body, MessageKind::Call)
            .await
        {
            Ok(message) => message,
            Err(e) => {
                error!(call_id = %info.call_id, error = %e, "Failed to create call message");
                return;
            }
        };

        info!(
            call_id = %info.call_id,
            duration_seconds = info.duration_seconds,
            participants = info.participants.len(),
            status = ?content.status,
            "Call message created"
        );
        let event = MessageCreate {
            conversation_id: info.conversation_id,
            message,
        };
        self.fanout
            .to_participants(info.conversation_id, EventType::MessageCreate, &event)
            .await;
    }

    async fn grant(&self, call_id: Uuid, user_id: Uuid, started: bool) -> AppResult<CallJoin> {
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        let grant = self.media.issue(call_id, user_id, user.display_name())?;
        Ok(CallJoin {
            call_id,
            started,
            token: grant.token,
            media_url: grant.url,
        })
    }

    async fn require_participant(&self, conversation_id: Uuid, user_id: Uuid) -> AppResult<()> {
        if self
            .conversations
            .is_participant(conversation_id, user_id)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::authorization("Not a participant of this conversation"))
        }
    }
}
