//! Authentication middleware: bearer token → `AuthenticatedUser`.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppState;
use crate::error::AppError;

/// Axum middleware: resolves `Authorization: Bearer <token>` to a user and
/// injects the `AuthenticatedUser` into request extensions.
///
/// Every failure yields the same 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let user = state.resolver.authenticate_header(header).await?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
