//! Call sessions: the lifecycle state machine and the service announcing it.

pub mod machine;
pub mod service;

pub use machine::{CallEntry, CallStateMachine, LeaveOutcome};
pub use service::{CallJoin, CallService};
