//! # murmur-api
//!
//! HTTP API layer for Murmur built on Axum.
//!
//! Provides the REST endpoints for calls, friends, and messaging, the
//! `/ws` transport in front of the real-time engine, the bearer-token
//! extractor, DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
