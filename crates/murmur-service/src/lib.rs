//! # murmur-service
//!
//! Use-case layer for Murmur. Each service drives its store collaborators
//! and then announces the resulting state changes through the realtime
//! publisher.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references or cheap clones.

pub mod calls;
pub mod context;
pub mod fanout;
pub mod messaging;
pub mod social;

pub use calls::{CallJoin, CallService, CallStateMachine, LeaveOutcome};
pub use context::RequestContext;
pub use fanout::ConversationFanout;
pub use messaging::{ConversationService, MessageService};
pub use social::FriendService;
