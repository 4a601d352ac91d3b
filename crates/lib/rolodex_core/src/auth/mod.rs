//! Authentication and session logic.
//!
//! Password hashing, purpose-tagged JWTs, the username-keyed user cache,
//! the bearer-token resolver, and the registration/login/confirmation/reset
//! flows built on top of them.

pub mod cache;
pub mod jwt;
pub mod memory;
pub mod password;
pub mod queries;
pub mod repository;
pub mod resolver;
pub mod service;

use thiserror::Error;

/// Authentication errors.
///
/// `InvalidToken` and `TokenExpired` are kept apart so callers can tell
/// "log in again" from "reject outright"; the HTTP layer collapses them.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Missing credentials")]
    MissingCredential,

    #[error("Could not validate credentials")]
    Unauthenticated,

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Email already confirmed")]
    AlreadyConfirmed,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Connection-level failures may succeed on retry; anything else the
/// database reports is a bug or bad data.
impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => AuthError::StoreUnavailable(e.to_string()),
            _ => AuthError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_failures_are_retryable() {
        assert!(matches!(
            AuthError::from(sqlx::Error::PoolTimedOut),
            AuthError::StoreUnavailable(_)
        ));
        assert!(matches!(
            AuthError::from(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused"
            ))),
            AuthError::StoreUnavailable(_)
        ));
    }

    #[test]
    fn other_database_errors_are_internal() {
        assert!(matches!(
            AuthError::from(sqlx::Error::RowNotFound),
            AuthError::Internal(_)
        ));
        assert!(matches!(
            AuthError::from(sqlx::Error::ColumnNotFound("role".into())),
            AuthError::Internal(_)
        ));
    }
}
