//! Application error types.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use rolodex_core::auth::AuthError;
use rolodex_core::contacts::ContactError;
use thiserror::Error;
use tracing::{debug, error};

use crate::models::ErrorResponse;

/// Message for every authentication failure, whatever the cause.
pub const UNAUTHENTICATED_MESSAGE: &str = "Could not validate credentials";

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database unavailable: {0}")]
    DbUnavailable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    /// Map a failure of a token carried in a link (confirm, reset) to a
    /// plain 400.
    pub fn verification(e: AuthError) -> Self {
        match e {
            AuthError::InvalidToken | AuthError::TokenExpired => {
                AppError::BadRequest("Verification error".into())
            }
            other => AppError::from(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", m.as_str())
            }
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.as_str()),
            AppError::DbUnavailable(m) => {
                error!("database unavailable: {m}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "db_unavailable",
                    "Database unavailable",
                )
            }
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::EmailNotConfirmed => (
                StatusCode::UNAUTHORIZED,
                "email_not_confirmed",
                "Email not confirmed",
            ),
            AppError::Internal(m) => {
                error!("internal error: {m}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        let mut response = (status, body).into_response();
        if matches!(self, AppError::Unauthorized(_)) {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".into()),
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => {
                AppError::DbUnavailable(e.to_string())
            }
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::MissingCredential
            | AuthError::Unauthenticated => {
                debug!("authentication failed: {e}");
                AppError::Unauthorized(UNAUTHENTICATED_MESSAGE.into())
            }
            AuthError::EmailNotConfirmed => AppError::EmailNotConfirmed,
            AuthError::Conflict(msg) => AppError::Conflict(msg),
            AuthError::AlreadyConfirmed => AppError::BadRequest("Email already confirmed".into()),
            AuthError::StoreUnavailable(msg) => AppError::DbUnavailable(msg),
            AuthError::Validation(msg) => AppError::Validation(msg),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<ContactError> for AppError {
    fn from(e: ContactError) -> Self {
        match e {
            ContactError::Validation(msg) => AppError::Validation(msg),
            ContactError::NotFound => AppError::NotFound("Contact not found".into()),
            ContactError::DbError(e) => AppError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_share_one_response() {
        for e in [
            AuthError::InvalidToken,
            AuthError::TokenExpired,
            AuthError::MissingCredential,
            AuthError::Unauthenticated,
        ] {
            let response = AppError::from(e).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
        }
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (AuthError::EmailNotConfirmed, StatusCode::UNAUTHORIZED),
            (AuthError::Conflict("x".into()), StatusCode::CONFLICT),
            (AuthError::AlreadyConfirmed, StatusCode::BAD_REQUEST),
            (
                AuthError::StoreUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AuthError::Validation("bad".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AuthError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (e, status) in cases {
            assert_eq!(AppError::from(e).into_response().status(), status);
        }
    }

    #[test]
    fn link_token_failures_are_bad_requests() {
        assert_eq!(
            AppError::verification(AuthError::TokenExpired)
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::verification(AuthError::AlreadyConfirmed)
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::verification(AuthError::StoreUnavailable("down".into()))
                .into_response()
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn contact_errors() {
        assert_eq!(
            AppError::from(ContactError::NotFound)
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(ContactError::Validation("x".into()))
                .into_response()
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
