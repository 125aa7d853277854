//! # murmur-database
//!
//! Collaborator store traits consumed by the realtime and service layers,
//! PostgreSQL implementations of those traits, and a process-local
//! in-memory implementation.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{CallStore, ConversationStore, MessageStore, SocialGraphStore, Stores, UserStore};
