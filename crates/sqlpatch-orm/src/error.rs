//! Error types for the execution context.

use thiserror::Error;

/// Execution context errors.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Compilation, dialect lookup, cancellation or loader error.
    #[error(transparent)]
    Core(#[from] sqlpatch_core::Error),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl OrmError {
    /// Returns true when the unit of work was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Core(sqlpatch_core::Error::Cancelled))
    }
}

/// Result type alias for execution context operations.
pub type Result<T> = std::result::Result<T, OrmError>;
