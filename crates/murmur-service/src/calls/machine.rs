//! Call session state machine.
//!
//! Per conversation a call moves `NoActiveCall → Active → Ended`. The state
//! lives in the call store as a session row with a null `ended_at` plus its
//! live participant rows. Every transition is one of the store's atomic
//! compare-and-swap steps; the machine composes them and treats a lost race
//! as an ordinary outcome rather than an error.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use murmur_core::error::{AppError, ErrorKind};
use murmur_core::result::AppResult;
use murmur_database::store::{CallStore, ConversationStore};
use murmur_entity::call::{Call, CallEndInfo};

/// Result of entering a call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallEntry {
    /// The active call.
    pub call: Call,
    /// `true` when this request created the session.
    pub started: bool,
    /// `false` when the user already had a live membership (re-entry).
    pub joined: bool,
}

/// Result of leaving a call.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaveOutcome {
    /// Left; the call is still active (or the user was not in it).
    Left,
    /// This leave ended the call.
    Ended(CallEndInfo),
    /// The call had already been ended by someone else.
    AlreadyEnded,
}

/// Drives call transitions against the call store.
#[derive(Clone)]
pub struct CallStateMachine {
    calls: Arc<dyn CallStore>,
    conversations: Arc<dyn ConversationStore>,
}

impl std::fmt::Debug for CallStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallStateMachine").finish()
    }
}

impl CallStateMachine {
    /// Creates a new state machine.
    pub fn new(calls: Arc<dyn CallStore>, conversations: Arc<dyn ConversationStore>) -> Self {
        Self {
            calls,
            conversations,
        }
    }

    /// Start the conversation's call, or join the one already running.
    ///
    /// Re-entering a call the user is already in is a no-op join.
    pub async fn start_or_join(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<CallEntry> {
        self.require_participant(conversation_id, user_id).await?;
        self.ensure_not_elsewhere(user_id, Some(conversation_id), None)
            .await?;

        // The running session may end before it is read back or before the
        // join lands; one retry then starts a fresh session.
        for _ in 0..2 {
            let (call, created) = match self
                .calls
                .start_or_get_active(conversation_id, user_id, now)
                .await
            {
                Ok(found) => found,
                Err(e) if e.is(ErrorKind::Gone) => {
                    warn!(conversation_id = %conversation_id, "Active call ended while starting, retrying");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if created {
                info!(call_id = %call.id, conversation_id = %conversation_id, user_id = %user_id, "Call started");
                return Ok(CallEntry {
                    call,
                    started: true,
                    joined: true,
                });
            }
            match self.calls.add_participant(call.id, user_id, now).await {
                Ok(joined) => {
                    info!(call_id = %call.id, user_id = %user_id, joined, "Call joined");
                    return Ok(CallEntry {
                        call,
                        started: false,
                        joined,
                    });
                }
                Err(e) if e.is(ErrorKind::Gone) => {
                    warn!(call_id = %call.id, "Call ended while joining, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::conflict("Call state changed concurrently, try again"))
    }

    /// Join a specific call.
    pub async fn join(&self, call_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> AppResult<CallEntry> {
        let call = self.load(call_id).await?;
        if !call.is_active() {
            return Err(AppError::gone("Call has ended"));
        }
        self.require_participant(call.conversation_id, user_id)
            .await?;
        self.ensure_not_elsewhere(user_id, None, Some(call.id))
            .await?;

        let joined = self.calls.add_participant(call.id, user_id, now).await?;
        info!(call_id = %call.id, user_id = %user_id, joined, "Call joined");
        Ok(CallEntry {
            call,
            started: false,
            joined,
        })
    }

    /// Leave a call, ending it when the last live participant leaves.
    ///
    /// Of any number of concurrent leaves that empty the call, exactly one
    /// observes [`LeaveOutcome::Ended`].
    pub async fn leave(
        &self,
        call_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<(Call, LeaveOutcome)> {
        let call = self.load(call_id).await?;
        if !call.is_active() {
            return Ok((call, LeaveOutcome::AlreadyEnded));
        }

        let was_member = self.calls.mark_left(call.id, user_id, now).await?;
        if !was_member {
            info!(call_id = %call.id, user_id = %user_id, "Leave from non-participant ignored");
        }
        if self.calls.count_active_participants(call.id).await? > 0 {
            return Ok((call, LeaveOutcome::Left));
        }

        match self.finish(call.id, now, false).await? {
            Some(info) => Ok((call, LeaveOutcome::Ended(info))),
            None => {
                // Lost the swap: either another leave ended it or someone
                // joined in between.
                let current = self.load(call_id).await?;
                let outcome = if current.is_active() {
                    LeaveOutcome::Left
                } else {
                    LeaveOutcome::AlreadyEnded
                };
                Ok((call, outcome))
            }
        }
    }

    /// Force-end a call, closing every live membership.
    ///
    /// Returns `None` when the call was already ended.
    pub async fn end(&self, call_id: Uuid, now: DateTime<Utc>) -> AppResult<(Call, Option<CallEndInfo>)> {
        let call = self.load(call_id).await?;
        if !call.is_active() {
            return Ok((call, None));
        }
        let info = self.finish(call.id, now, true).await?;
        Ok((call, info))
    }

    async fn finish(&self, call_id: Uuid, now: DateTime<Utc>, force: bool) -> AppResult<Option<CallEndInfo>> {
        let Some(ended) = self.calls.try_end(call_id, now, force).await? else {
            return Ok(None);
        };

        let participants = match self.calls.participant_history(call_id).await {
            Ok(history) if !history.is_empty() => history,
            Ok(_) => vec![ended.started_by],
            Err(e) => {
                warn!(call_id = %call_id, error = %e, "Failed to load participant history, assuming starter only");
                vec![ended.started_by]
            }
        };
        let info = CallEndInfo::from_call(&ended, participants)
            .ok_or_else(|| AppError::internal("Ended call has no end time"))?;
        info!(
            call_id = %call_id,
            duration_seconds = info.duration_seconds,
            participants = info.participants.len(),
            forced = force,
            "Call ended"
        );
        Ok(Some(info))
    }

    async fn load(&self, call_id: Uuid) -> AppResult<Call> {
        self.calls
            .find_call(call_id)
            .await?
            .ok_or_else(|| AppError::not_found("Call not found"))
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

    /// Fail when the user is live in a call other than the one targeted.
    async fn ensure_not_elsewhere(
        &self,
        user_id: Uuid,
        conversation_id: Option<Uuid>,
        call_id: Option<Uuid>,
    ) -> AppResult<()> {
        match self.calls.find_active_for_user(user_id).await? {
            Some(current)
                if Some(current.conversation_id) != conversation_id && Some(current.id) != call_id =>
            {
                Err(AppError::conflict("Already in another call"))
            }
            _ => Ok(()),
        }
    }
}
