//! Contact handlers. Every operation is scoped to the caller.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use rolodex_core::contacts::{ContactError, queries};
use rolodex_core::models::auth::AuthenticatedUser;
use rolodex_core::models::contact::{Contact, ContactInput};
use uuid::Uuid;

use crate::AppState;
use crate::error::AppResult;
use crate::models::{ContactRequest, ContactResponse, PageQuery, SearchQuery};

fn many(rows: Vec<Contact>) -> Json<Vec<ContactResponse>> {
    Json(rows.into_iter().map(ContactResponse::from).collect())
}

/// `GET /contacts`
pub async fn list_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<Vec<ContactResponse>>> {
    let rows = queries::list_contacts(&state.pool, user.id, page.into()).await?;
    Ok(many(rows))
}

/// `POST /contacts`
pub async fn create_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<ContactRequest>,
) -> AppResult<(StatusCode, Json<ContactResponse>)> {
    let input = ContactInput::from(body);
    let contact = queries::create_contact(&state.pool, user.id, &input).await?;
    Ok((StatusCode::CREATED, Json(contact.into())))
}

/// `GET /contacts/search`
pub async fn search_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<ContactResponse>>> {
    let (filter, page) = query.into_parts();
    let rows = queries::search_contacts(&state.pool, user.id, &filter, page).await?;
    Ok(many(rows))
}

/// `GET /contacts/birthdays`: birthdays in the coming week, soonest first.
pub async fn birthdays_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<Vec<ContactResponse>>> {
    let today = Utc::now().date_naive();
    let rows = queries::upcoming_birthdays(&state.pool, user.id, today, page.into()).await?;
    Ok(many(rows))
}

/// `GET /contacts/{id}`
pub async fn get_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ContactResponse>> {
    let contact = queries::get_contact(&state.pool, user.id, id)
        .await?
        .ok_or(ContactError::NotFound)?;
    Ok(Json(contact.into()))
}

/// `PUT /contacts/{id}`
pub async fn update_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<ContactRequest>,
) -> AppResult<Json<ContactResponse>> {
    let input = ContactInput::from(body);
    let contact = queries::update_contact(&state.pool, user.id, id, &input)
        .await?
        .ok_or(ContactError::NotFound)?;
    Ok(Json(contact.into()))
}

/// `DELETE /contacts/{id}`: returns the removed contact.
pub async fn delete_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ContactResponse>> {
    let contact = queries::delete_contact(&state.pool, user.id, id)
        .await?
        .ok_or(ContactError::NotFound)?;
    Ok(Json(contact.into()))
}
