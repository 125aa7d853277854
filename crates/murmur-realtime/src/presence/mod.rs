//! User presence tracking and presence-change fan-out.

pub mod notifier;
pub mod tracker;

pub use notifier::PresenceNotifier;
pub use tracker::PresenceTracker;
