//! Health check endpoint.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::MessageResponse;

/// `GET /api/healthchecker`: verifies the database answers.
pub async fn healthchecker(State(state): State<AppState>) -> AppResult<Json<MessageResponse>> {
    if !rolodex_core::db::ping(&state.pool).await {
        return Err(AppError::DbUnavailable(
            "health check query failed".into(),
        ));
    }
    Ok(Json(MessageResponse::new("Welcome to Rolodex!")))
}
