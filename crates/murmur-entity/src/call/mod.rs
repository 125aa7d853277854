//! Call sessions and their participants.

pub mod end_info;
pub mod model;

pub use end_info::CallEndInfo;
pub use model::{ActiveCall, Call, CallParticipant};
