//! Account flows: registration, login, email confirmation and password
//! reset.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::AuthError;
use super::cache::UserCache;
use super::jwt::TokenService;
use super::password::{hash_password, verify_password_or_dummy};
use super::repository::UserRepository;
use super::resolver::AuthResolver;
use crate::email::{EmailParams, EmailSender, EmailTemplate};
use crate::models::auth::{AccessToken, AuthenticatedUser, NewUser, TokenPurpose, User};
use crate::validation::is_email;

/// Registration input. The password is plaintext until hashed here.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl NewAccount {
    fn validate(&self) -> Result<(), AuthError> {
        if self.username.trim().is_empty() {
            return Err(AuthError::Validation("username must not be empty".into()));
        }
        if !is_email(&self.email) {
            return Err(AuthError::Validation("email is not valid".into()));
        }
        if self.password.is_empty() {
            return Err(AuthError::Validation("password must not be empty".into()));
        }
        Ok(())
    }
}

/// Credential flows over a user store, the token service and the cache.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
    cache: UserCache,
    email: Arc<dyn EmailSender>,
    base_url: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<TokenService>,
        cache: UserCache,
        email: Arc<dyn EmailSender>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            tokens,
            cache,
            email,
            base_url: base_url.into(),
        }
    }

    /// A resolver sharing this service's store, tokens and cache.
    pub fn resolver(&self) -> AuthResolver {
        AuthResolver::new(self.tokens.clone(), self.cache.clone(), self.users.clone())
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Create an unconfirmed account and mail a confirmation link.
    pub async fn register(&self, account: NewAccount) -> Result<User, AuthError> {
        account.validate()?;

        if self.users.find_by_email(&account.email).await?.is_some() {
            return Err(AuthError::Conflict("email already registered".into()));
        }
        if self.users.find_by_username(&account.username).await?.is_some() {
            return Err(AuthError::Conflict("username already taken".into()));
        }

        let password_hash = hash_password(&account.password)?;
        let user = self
            .users
            .create(NewUser {
                username: account.username,
                email: account.email,
                password_hash,
                avatar: None,
            })
            .await?;
        info!(username = %user.username, "user registered");

        self.send_token_mail(&user, TokenPurpose::EmailConfirm, EmailTemplate::ConfirmEmail)?;
        Ok(user)
    }

    /// Exchange username + password for an access token.
    ///
    /// Unknown username and wrong password fail identically.
    pub async fn login(&self, username: &str, password: &str) -> Result<AccessToken, AuthError> {
        let found = self.users.find_by_username(username).await?;
        let verified = verify_password_or_dummy(
            password,
            found.as_ref().map(|u| u.password_hash.as_str()),
        );
        let user = match found {
            Some(user) if verified => user,
            _ => {
                debug!(username, "login rejected");
                return Err(AuthError::Unauthenticated);
            }
        };

        if !user.confirmed {
            return Err(AuthError::EmailNotConfirmed);
        }

        let access_token = self.tokens.issue(&user.username, TokenPurpose::Access)?;
        Ok(AccessToken {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: self
                .tokens
                .config()
                .ttl_for(TokenPurpose::Access)
                .num_seconds(),
        })
    }

    /// Mark the account behind an email-confirmation token as confirmed.
    pub async fn confirm_email(&self, token: &str) -> Result<(), AuthError> {
        let email = self.tokens.verify(token, TokenPurpose::EmailConfirm)?;
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        if user.confirmed {
            return Err(AuthError::AlreadyConfirmed);
        }
        self.users.set_confirmed(&email).await?;
        info!(username = %user.username, "email confirmed");
        Ok(())
    }

    /// Send a fresh confirmation link if the account exists and still needs
    /// one. Reports success either way.
    pub async fn resend_confirmation(&self, email: &str) -> Result<(), AuthError> {
        match self.users.find_by_email(email).await? {
            Some(user) if !user.confirmed => {
                self.send_token_mail(
                    &user,
                    TokenPurpose::EmailConfirm,
                    EmailTemplate::ConfirmEmail,
                )?;
            }
            Some(_) => debug!("confirmation resend skipped: already confirmed"),
            None => debug!("confirmation resend skipped: unknown email"),
        }
        Ok(())
    }

    /// Mail a password-reset link if the account exists. Reports success
    /// either way.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        match self.users.find_by_email(email).await? {
            Some(user) => self.send_token_mail(
                &user,
                TokenPurpose::PasswordReset,
                EmailTemplate::ResetPassword,
            )?,
            None => debug!("password reset skipped: unknown email"),
        }
        Ok(())
    }

    /// Check a password-reset token without consuming it, returning the
    /// account it belongs to.
    pub async fn check_reset_token(&self, token: &str) -> Result<User, AuthError> {
        let email = self.tokens.verify(token, TokenPurpose::PasswordReset)?;
        self.users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    /// Replace the password of the account behind a reset token.
    ///
    /// Access tokens issued before the reset stay valid until they expire.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<User, AuthError> {
        if new_password.is_empty() {
            return Err(AuthError::Validation("password must not be empty".into()));
        }
        let user = self.check_reset_token(token).await?;
        let password_hash = hash_password(new_password)?;
        let user = self.users.update_password(&user.email, &password_hash).await?;
        info!(username = %user.username, "password reset");
        Ok(user)
    }

    /// Store a new avatar URL and refresh the cached identity.
    pub async fn update_avatar(
        &self,
        current: &AuthenticatedUser,
        avatar_url: &str,
    ) -> Result<User, AuthError> {
        let user = self.users.update_avatar(&current.email, avatar_url).await?;
        self.cache
            .put(&user.username, &AuthenticatedUser::from(&user))
            .await;
        Ok(user)
    }

    /// Issue a token for `purpose` addressed to the user's email and hand the
    /// mail to a background task.
    fn send_token_mail(
        &self,
        user: &User,
        purpose: TokenPurpose,
        template: EmailTemplate,
    ) -> Result<(), AuthError> {
        let token = self.tokens.issue(&user.email, purpose)?;
        let sender = self.email.clone();
        let to = user.email.clone();
        let params = EmailParams {
            username: user.username.clone(),
            base_url: self.base_url.clone(),
            token,
        };
        tokio::spawn(async move {
            if let Err(e) = sender.send(&to, template, params).await {
                warn!(error = %e, subject = template.subject(), "email send failed");
            }
        });
        Ok(())
    }
}
