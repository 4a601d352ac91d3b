//! Current-user handlers.

use axum::extract::State;
use axum::{Extension, Json};
use rolodex_core::models::auth::AuthenticatedUser;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{AvatarRequest, UserResponse};

const AVATAR_MAX_LEN: usize = 255;

/// `GET /users/me`
pub async fn me_handler(Extension(user): Extension<AuthenticatedUser>) -> Json<UserResponse> {
    Json(user.into())
}

/// `PATCH /users/avatar`
pub async fn update_avatar_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<AvatarRequest>,
) -> AppResult<Json<UserResponse>> {
    let url = body.avatar_url.trim();
    if url.is_empty() || url.chars().count() > AVATAR_MAX_LEN {
        return Err(AppError::Validation(
            "avatarUrl must be between 1 and 255 characters".into(),
        ));
    }
    let updated = state.auth.update_avatar(&user, url).await?;
    Ok(Json(UserResponse::from(&updated)))
}
