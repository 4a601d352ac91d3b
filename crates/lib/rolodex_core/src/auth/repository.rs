//! User store abstraction consumed by the resolver and the credential flows.

use async_trait::async_trait;

use super::AuthError;
use crate::models::auth::{NewUser, User};

/// Persistent user store.
///
/// Implementations report backend failures as `AuthError::StoreUnavailable`
/// and a uniqueness violation on `create` as `AuthError::Conflict`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn create(&self, user: NewUser) -> Result<User, AuthError>;

    /// Overwrite the stored password hash of the user with `email`.
    async fn update_password(&self, email: &str, password_hash: &str) -> Result<User, AuthError>;

    async fn set_confirmed(&self, email: &str) -> Result<(), AuthError>;

    async fn update_avatar(&self, email: &str, avatar: &str) -> Result<User, AuthError>;
}
