//! Contact database queries.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::ContactError;
use super::birthdays::{BirthdayWindow, UPCOMING_DAYS};
use crate::models::contact::{Contact, ContactFilter, ContactInput, Page};
use crate::uuid::uuidv7;

const CONTACT_COLUMNS: &str = "id, user_id, first_name, last_name, email, phone, birthday, note, \
                               created_at, updated_at";

/// Month/day of `birthday` as `month * 100 + day`.
const MONTH_DAY: &str =
    "(EXTRACT(MONTH FROM birthday)::int * 100 + EXTRACT(DAY FROM birthday)::int)";

/// List a user's contacts.
pub async fn list_contacts(
    pool: &PgPool,
    user_id: Uuid,
    page: Page,
) -> Result<Vec<Contact>, ContactError> {
    let sql = format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts WHERE user_id = $1 \
         ORDER BY last_name, first_name, id OFFSET $2 LIMIT $3"
    );
    let rows = sqlx::query_as::<_, Contact>(&sql)
        .bind(user_id)
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Fetch one of the user's contacts.
pub async fn get_contact(
    pool: &PgPool,
    user_id: Uuid,
    contact_id: Uuid,
) -> Result<Option<Contact>, ContactError> {
    let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1 AND user_id = $2");
    let row = sqlx::query_as::<_, Contact>(&sql)
        .bind(contact_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Create a contact owned by `user_id`.
pub async fn create_contact(
    pool: &PgPool,
    user_id: Uuid,
    input: &ContactInput,
) -> Result<Contact, ContactError> {
    input.validate()?;
    let sql = format!(
        "INSERT INTO contacts (id, user_id, first_name, last_name, email, phone, birthday, note) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {CONTACT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Contact>(&sql)
        .bind(uuidv7())
        .bind(user_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.birthday)
        .bind(&input.note)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Replace every writable field of one of the user's contacts.
pub async fn update_contact(
    pool: &PgPool,
    user_id: Uuid,
    contact_id: Uuid,
    input: &ContactInput,
) -> Result<Option<Contact>, ContactError> {
    input.validate()?;
    let sql = format!(
        "UPDATE contacts SET first_name = $3, last_name = $4, email = $5, phone = $6, \
         birthday = $7, note = $8, updated_at = now() \
         WHERE id = $1 AND user_id = $2 RETURNING {CONTACT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Contact>(&sql)
        .bind(contact_id)
        .bind(user_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.birthday)
        .bind(&input.note)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Delete one of the user's contacts, returning it.
pub async fn delete_contact(
    pool: &PgPool,
    user_id: Uuid,
    contact_id: Uuid,
) -> Result<Option<Contact>, ContactError> {
    let sql = format!(
        "DELETE FROM contacts WHERE id = $1 AND user_id = $2 RETURNING {CONTACT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Contact>(&sql)
        .bind(contact_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Exact-match search over first name, last name and email. Unset filters
/// match everything.
pub async fn search_contacts(
    pool: &PgPool,
    user_id: Uuid,
    filter: &ContactFilter,
    page: Page,
) -> Result<Vec<Contact>, ContactError> {
    let sql = format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts \
         WHERE user_id = $1 \
           AND ($2::text IS NULL OR first_name = $2) \
           AND ($3::text IS NULL OR last_name = $3) \
           AND ($4::text IS NULL OR email = $4) \
         ORDER BY last_name, first_name, id OFFSET $5 LIMIT $6"
    );
    let rows = sqlx::query_as::<_, Contact>(&sql)
        .bind(user_id)
        .bind(&filter.first_name)
        .bind(&filter.last_name)
        .bind(&filter.email)
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Contacts whose birthday falls within the next `UPCOMING_DAYS` days of
/// `today`, soonest first.
pub async fn upcoming_birthdays(
    pool: &PgPool,
    user_id: Uuid,
    today: NaiveDate,
    page: Page,
) -> Result<Vec<Contact>, ContactError> {
    let window = BirthdayWindow::starting(today, UPCOMING_DAYS);
    let sql = format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts \
         WHERE user_id = $1 \
           AND CASE WHEN $2 <= $3 THEN {MONTH_DAY} BETWEEN $2 AND $3 \
                    ELSE {MONTH_DAY} >= $2 OR {MONTH_DAY} <= $3 END \
         ORDER BY ({MONTH_DAY} - $2 + 1300) % 1300, last_name, first_name, id \
         OFFSET $4 LIMIT $5"
    );
    let rows = sqlx::query_as::<_, Contact>(&sql)
        .bind(user_id)
        .bind(window.start)
        .bind(window.end)
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
