//! PostgreSQL-backed `UserRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::AuthError;
use super::repository::UserRepository;
use crate::models::auth::{NewUser, User, UserRole};
use crate::uuid::uuidv7;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, avatar, confirmed, role::text AS role, created_at";

/// Row shape of the `users` table.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    avatar: Option<String>,
    confirmed: bool,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<UserRole>().map_err(AuthError::Internal)?;
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            avatar: row.avatar,
            confirmed: row.confirmed,
            role,
            created_at: row.created_at,
        })
    }
}

fn missing(email: &str) -> AuthError {
    AuthError::Internal(format!("no user with email {email}"))
}

/// User store over a shared connection pool. Each call checks out its own
/// connection.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, AuthError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        self.find_one("email", email).await
    }

    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        let sql = format!(
            "INSERT INTO users (id, username, email, password_hash, avatar) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(uuidv7())
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.avatar)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let unique = e
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation());
                if unique {
                    AuthError::Conflict("username or email already registered".into())
                } else {
                    AuthError::from(e)
                }
            })?;
        User::try_from(row)
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<User, AuthError> {
        let sql = format!(
            "UPDATE users SET password_hash = $2 WHERE email = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .bind(password_hash)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| missing(email))?;
        User::try_from(row)
    }

    async fn set_confirmed(&self, email: &str) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE users SET confirmed = TRUE WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(missing(email));
        }
        Ok(())
    }

    async fn update_avatar(&self, email: &str, avatar: &str) -> Result<User, AuthError> {
        let sql =
            format!("UPDATE users SET avatar = $2 WHERE email = $1 RETURNING {USER_COLUMNS}");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .bind(avatar)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| missing(email))?;
        User::try_from(row)
    }
}
