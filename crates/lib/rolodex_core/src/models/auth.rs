//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! types (which use camelCase and never expose password hashes).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Persistent user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub confirmed: bool,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
}

/// The principal attached to an authenticated request.
///
/// This is also the exact shape stored in the user cache, so a cache hit and
/// a store lookup produce identical values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub role: UserRole,
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            role: user.role,
        }
    }
}

/// What a signed token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Access,
    EmailConfirm,
    PasswordReset,
}

impl TokenPurpose {
    pub const ALL: [TokenPurpose; 3] = [
        TokenPurpose::Access,
        TokenPurpose::EmailConfirm,
        TokenPurpose::PasswordReset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Access => "access",
            TokenPurpose::EmailConfirm => "email_confirm",
            TokenPurpose::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: username for access tokens, email for confirm/reset tokens.
    pub sub: String,
    /// Intended use of the token.
    pub purpose: TokenPurpose,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_and_displays() {
        assert_eq!("admin".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!(UserRole::User.to_string(), "user");
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn purpose_serializes_snake_case() {
        let json = serde_json::to_string(&TokenPurpose::EmailConfirm).unwrap();
        assert_eq!(json, "\"email_confirm\"");
    }

    #[test]
    fn authenticated_user_drops_credentials() {
        let user = User {
            id: Uuid::nil(),
            username: "alice".into(),
            email: "alice@x.com".into(),
            password_hash: "$2b$10$hash".into(),
            avatar: None,
            confirmed: true,
            role: UserRole::Admin,
            created_at: Utc::now(),
        };
        let principal = AuthenticatedUser::from(&user);
        let json = serde_json::to_string(&principal).unwrap();
        assert!(!json.contains("hash"));
        assert_eq!(principal.role, UserRole::Admin);
    }
}
