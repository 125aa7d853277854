//! Messages, reactions, and call system-message content.

pub mod call_content;
pub mod model;
pub mod reaction;

pub use call_content::{CallMessageContent, CallOutcome};
pub use model::{Message, MessageKind};
pub use reaction::Reaction;
