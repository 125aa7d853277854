//! Process-local store implementing every collaborator trait.
//!
//! All state sits behind one `tokio::sync::Mutex`, so each trait method
//! executes as a single atomic unit, mirroring a transaction in the
//! PostgreSQL implementation.

mod state;
mod store;

pub use store::MemoryStore;
