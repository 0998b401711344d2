//! Error types for patch compilation and association loading.

use thiserror::Error;

/// Recoverable errors raised by the core.
///
/// Programming errors (a patch whose columns and values disagree, an entity
/// type that was never registered, ...) are not represented here: those
/// panic, since they cannot happen with a correctly generated call site.
#[derive(Debug, Error)]
pub enum Error {
    /// A statement builder could not render valid SQL.
    #[error("invalid statement: {0}")]
    InvalidStatement(String),

    /// No dialect is registered under the requested name.
    #[error("unknown dialect {0:?}")]
    UnknownDialect(String),

    /// The unit of work was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// An error raised by an external collaborator (a loader, a driver, ...).
    ///
    /// The original error is kept as the source, untouched.
    #[error(transparent)]
    External(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an error raised outside of the core.
    pub fn external<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::External(Box::new(err))
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidStatement(message.into())
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
