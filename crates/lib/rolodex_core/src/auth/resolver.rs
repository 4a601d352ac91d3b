//! Bearer token → authenticated user.
//!
//! Each request walks the same steps in order and stops at the first
//! success or failure: extract the bearer token, verify it as an access
//! token, try the user cache, fall back to the store, repopulate the cache.

use std::sync::Arc;

use tracing::{debug, warn};

use super::AuthError;
use super::cache::UserCache;
use super::jwt::TokenService;
use super::repository::UserRepository;
use crate::models::auth::{AuthenticatedUser, TokenPurpose};

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?.trim();
    let (scheme, token) = header
        .split_once(' ')
        .ok_or(AuthError::MissingCredential)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

/// Resolves bearer tokens to users. Fails closed.
#[derive(Clone)]
pub struct AuthResolver {
    tokens: Arc<TokenService>,
    cache: UserCache,
    users: Arc<dyn UserRepository>,
}

impl AuthResolver {
    pub fn new(tokens: Arc<TokenService>, cache: UserCache, users: Arc<dyn UserRepository>) -> Self {
        Self {
            tokens,
            cache,
            users,
        }
    }

    /// Resolve a raw `Authorization` header value.
    pub async fn authenticate_header(
        &self,
        header: Option<&str>,
    ) -> Result<AuthenticatedUser, AuthError> {
        let token = bearer_token(header)?;
        self.authenticate(token).await
    }

    /// Resolve a bearer token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let username = match self.tokens.verify(token, TokenPurpose::Access) {
            Ok(subject) => subject,
            Err(AuthError::TokenExpired) => {
                debug!("access token expired");
                return Err(AuthError::Unauthenticated);
            }
            Err(AuthError::InvalidToken) => {
                debug!("access token invalid");
                return Err(AuthError::Unauthenticated);
            }
            Err(e) => {
                warn!(error = %e, "access token verification failed");
                return Err(AuthError::Unauthenticated);
            }
        };

        if let Some(user) = self.cache.get(&username).await {
            debug!(username, "user resolved from cache");
            return Ok(user);
        }

        // The token may outlive the account.
        let user = self
            .users
            .find_by_username(&username)
            .await?
            .ok_or_else(|| {
                debug!(username, "token subject no longer exists");
                AuthError::Unauthenticated
            })?;

        let principal = AuthenticatedUser::from(&user);
        self.cache.put(&username, &principal).await;
        debug!(username, "user resolved from store");
        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_extraction() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(Some("bearer  abc ")).unwrap(), "abc");
        assert!(matches!(
            bearer_token(None),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            bearer_token(Some("Basic abc")),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            bearer_token(Some("Bearer")),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            bearer_token(Some("Bearer   ")),
            Err(AuthError::MissingCredential)
        ));
    }
}
