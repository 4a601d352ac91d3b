//! In-memory `UserRepository`, used in tests and for running without
//! PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::AuthError;
use super::repository::UserRepository;
use crate::models::auth::{NewUser, User, UserRole};
use crate::uuid::uuidv7;

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed user, bypassing the uniqueness checks.
    pub async fn insert(&self, user: User) {
        self.users.write().await.push(user);
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// Apply `f` to the user with `email`, returning the updated copy.
    async fn modify<F>(&self, email: &str, f: F) -> Result<User, AuthError>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| AuthError::Internal(format!("no user with email {email}")))?;
        f(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(AuthError::Conflict("email already registered".into()));
        }
        if users.iter().any(|u| u.username == user.username) {
            return Err(AuthError::Conflict("username already taken".into()));
        }
        let created = User {
            id: uuidv7(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            avatar: user.avatar,
            confirmed: false,
            role: UserRole::User,
            created_at: Utc::now(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<User, AuthError> {
        self.modify(email, |u| u.password_hash = password_hash.to_string())
            .await
    }

    async fn set_confirmed(&self, email: &str) -> Result<(), AuthError> {
        self.modify(email, |u| u.confirmed = true).await.map(|_| ())
    }

    async fn update_avatar(&self, email: &str, avatar: &str) -> Result<User, AuthError> {
        self.modify(email, |u| u.avatar = Some(avatar.to_string()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password_hash: "hash".into(),
            avatar: None,
        }
    }

    #[tokio::test]
    async fn create_then_find() {
        let repo = MemoryUserRepository::new();
        let user = repo.create(new_user("alice", "alice@x.com")).await.unwrap();
        assert!(!user.confirmed);
        assert_eq!(user.role, UserRole::User);
        assert_eq!(
            repo.find_by_username("alice").await.unwrap().unwrap().id,
            user.id
        );
        assert_eq!(
            repo.find_by_email("alice@x.com").await.unwrap().unwrap().id,
            user.id
        );
        assert!(repo.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicates() {
        let repo = MemoryUserRepository::new();
        repo.create(new_user("alice", "alice@x.com")).await.unwrap();
        assert!(matches!(
            repo.create(new_user("alice", "other@x.com")).await,
            Err(AuthError::Conflict(_))
        ));
        assert!(matches!(
            repo.create(new_user("other", "alice@x.com")).await,
            Err(AuthError::Conflict(_))
        ));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn updates_apply_by_email() {
        let repo = MemoryUserRepository::new();
        repo.create(new_user("alice", "alice@x.com")).await.unwrap();
        repo.set_confirmed("alice@x.com").await.unwrap();
        let user = repo.update_password("alice@x.com", "new-hash").await.unwrap();
        assert!(user.confirmed);
        assert_eq!(user.password_hash, "new-hash");
        let user = repo.update_avatar("alice@x.com", "https://a/b.png").await.unwrap();
        assert_eq!(user.avatar.as_deref(), Some("https://a/b.png"));
        assert!(repo.set_confirmed("ghost@x.com").await.is_err());
    }
}
