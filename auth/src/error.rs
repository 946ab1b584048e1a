//! Error types for identity operations.

use thiserror::Error;

/// Result type alias for identity operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failure modes of registration, login and token checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Input rejected; the message says why.
    #[error("{0}")]
    Validation(String),

    /// A user with this email is already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// No user with this email.
    #[error("user not found")]
    UserNotFound,

    /// Password did not match.
    #[error("invalid password")]
    InvalidPassword,

    /// Bearer token unknown, revoked or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// User store failure.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Unexpected internal failure (poisoned lock, aborted task).
    #[error("Internal error")]
    InternalError,
}
