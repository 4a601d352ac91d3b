//! Authentication request handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use rolodex_core::auth::service::NewAccount;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    EmailRequest, LoginRequest, MessageResponse, RegisterRequest, ResetPasswordRequest,
    TokenResponse, UserResponse,
};

/// `POST /auth/register`: create an unconfirmed account.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .auth
        .register(NewAccount {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// `POST /auth/login`: exchange username + password for an access token.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state.auth.login(&body.username, &body.password).await?;
    Ok(Json(token.into()))
}

/// `GET /auth/confirmed_email/{token}`
pub async fn confirm_email_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state
        .auth
        .confirm_email(&token)
        .await
        .map_err(AppError::verification)?;
    Ok(Json(MessageResponse::new("Email confirmed")))
}

/// `POST /auth/request_email`: resend the confirmation link.
pub async fn request_email_handler(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.auth.resend_confirmation(&body.email).await?;
    Ok(Json(MessageResponse::new(
        "Check your email for confirmation.",
    )))
}

/// `POST /auth/reset_password_request`
pub async fn reset_password_request_handler(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.auth.request_password_reset(&body.email).await?;
    Ok(Json(MessageResponse::new(
        "If the account exists, a password reset link has been sent.",
    )))
}

/// `GET /auth/reset_password/{token}`: check a reset link before the
/// client shows its form.
pub async fn check_reset_token_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state
        .auth
        .check_reset_token(&token)
        .await
        .map_err(AppError::verification)?;
    Ok(Json(MessageResponse::new("Reset token is valid")))
}

/// `POST /auth/reset_password/{token}`
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .auth
        .reset_password(&token, &body.password)
        .await
        .map_err(AppError::verification)?;
    Ok(Json(MessageResponse::new("Password has been reset")))
}
