//! Convenience result type alias.

use crate::error::AppError;

/// Standard result type used throughout Murmur.
pub type AppResult<T> = Result<T, AppError>;
