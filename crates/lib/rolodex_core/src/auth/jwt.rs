//! Purpose-tagged JWT issuing and verification.
//!
//! One secret and one algorithm sign every token. The `purpose` claim keeps
//! access, email-confirmation and password-reset tokens from standing in
//! for one another.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use super::AuthError;
use crate::models::auth::{TokenClaims, TokenPurpose};

/// Signing algorithm used when none is configured.
pub const DEFAULT_ALGORITHM: &str = "HS256";

/// Access token lifetime: 1 hour.
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 60 * 60;

/// Email-confirmation token lifetime: 7 days.
pub const DEFAULT_EMAIL_CONFIRM_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Password-reset token lifetime: 24 hours.
pub const DEFAULT_PASSWORD_RESET_TTL_SECS: i64 = 24 * 60 * 60;

/// Immutable signing configuration, built once at startup.
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    algorithm: Algorithm,
    access_ttl: Duration,
    email_confirm_ttl: Duration,
    password_reset_ttl: Duration,
}

impl TokenConfig {
    /// Configuration with the default algorithm and lifetimes.
    pub fn new(secret: impl Into<String>) -> Result<Self, AuthError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AuthError::Validation("JWT secret must not be empty".into()));
        }
        Ok(Self {
            secret,
            algorithm: Algorithm::HS256,
            access_ttl: Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
            email_confirm_ttl: Duration::seconds(DEFAULT_EMAIL_CONFIRM_TTL_SECS),
            password_reset_ttl: Duration::seconds(DEFAULT_PASSWORD_RESET_TTL_SECS),
        })
    }

    /// Select the signing algorithm by its JWT name (e.g. `HS256`).
    pub fn with_algorithm(mut self, name: &str) -> Result<Self, AuthError> {
        self.algorithm = parse_algorithm(name)?;
        Ok(self)
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_email_confirm_ttl(mut self, ttl: Duration) -> Self {
        self.email_confirm_ttl = ttl;
        self
    }

    pub fn with_password_reset_ttl(mut self, ttl: Duration) -> Self {
        self.password_reset_ttl = ttl;
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Default lifetime for tokens of the given purpose.
    pub fn ttl_for(&self, purpose: TokenPurpose) -> Duration {
        match purpose {
            TokenPurpose::Access => self.access_ttl,
            TokenPurpose::EmailConfirm => self.email_confirm_ttl,
            TokenPurpose::PasswordReset => self.password_reset_ttl,
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_ttl", &self.access_ttl)
            .field("email_confirm_ttl", &self.email_confirm_ttl)
            .field("password_reset_ttl", &self.password_reset_ttl)
            .finish()
    }
}

/// Parse a JWT algorithm name, accepting only the HMAC family.
fn parse_algorithm(name: &str) -> Result<Algorithm, AuthError> {
    let algorithm = Algorithm::from_str(name)
        .map_err(|_| AuthError::Validation(format!("unknown JWT algorithm '{name}'")))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(AuthError::Validation(format!(
            "JWT algorithm {other:?} needs a key pair; only HS256/HS384/HS512 are supported"
        ))),
    }
}

/// Issues and verifies signed tokens. Stateless beyond its configuration.
#[derive(Clone)]
pub struct TokenService {
    config: TokenConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let encoding = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding,
            decoding,
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Issue a token with the default lifetime for `purpose`.
    pub fn issue(&self, subject: &str, purpose: TokenPurpose) -> Result<String, AuthError> {
        self.issue_with_ttl(subject, purpose, self.config.ttl_for(purpose))
    }

    /// Issue a token with an explicit lifetime.
    pub fn issue_with_ttl(
        &self,
        subject: &str,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        self.issue_at(subject, purpose, ttl, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        subject: &str,
        purpose: TokenPurpose,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Internal(format!("token lifetime {ttl} out of range")))?;
        let claims = TokenClaims {
            sub: subject.to_string(),
            purpose,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        encode(&Header::new(self.config.algorithm), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Verify a token for `expected` use, returning its subject.
    pub fn verify(&self, token: &str, expected: TokenPurpose) -> Result<String, AuthError> {
        self.verify_at(token, expected, Utc::now())
    }

    /// Verify a token against the clock value `now`.
    ///
    /// A token is expired once `now >= exp`. Signature, format and purpose
    /// failures all surface as `InvalidToken`; the specific cause is only
    /// logged.
    pub fn verify_at(
        &self,
        token: &str,
        expected: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let mut validation = Validation::new(self.config.algorithm);
        // Expiry is checked below against `now` rather than the system clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = match decode::<TokenClaims>(token, &self.decoding, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!(error = %e, "token rejected: bad signature or malformed payload");
                return Err(AuthError::InvalidToken);
            }
        };

        if now.timestamp() >= claims.exp {
            debug!(purpose = %claims.purpose, exp = claims.exp, "token rejected: expired");
            return Err(AuthError::TokenExpired);
        }

        if claims.purpose != expected {
            debug!(
                got = %claims.purpose,
                expected = %expected,
                "token rejected: purpose mismatch"
            );
            return Err(AuthError::InvalidToken);
        }

        Ok(claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(TokenConfig::new("test-secret").unwrap())
    }

    #[test]
    fn issue_and_verify_access_token() {
        let svc = service();
        let token = svc.issue("alice", TokenPurpose::Access).unwrap();
        assert_eq!(svc.verify(&token, TokenPurpose::Access).unwrap(), "alice");
    }

    #[test]
    fn purposes_are_not_interchangeable() {
        let svc = service();
        for issued in TokenPurpose::ALL {
            let token = svc.issue("alice@x.com", issued).unwrap();
            for checked in TokenPurpose::ALL {
                let result = svc.verify(&token, checked);
                if issued == checked {
                    assert!(result.is_ok(), "{issued} should verify as {checked}");
                } else {
                    assert!(
                        matches!(result, Err(AuthError::InvalidToken)),
                        "{issued} must not verify as {checked}"
                    );
                }
            }
        }
    }

    #[test]
    fn expiry_boundary() {
        let svc = service();
        let t0 = Utc::now();
        let ttl = Duration::seconds(60);
        let token = svc.issue_at("alice", TokenPurpose::Access, ttl, t0).unwrap();

        let before = t0 + ttl - Duration::seconds(1);
        assert_eq!(
            svc.verify_at(&token, TokenPurpose::Access, before).unwrap(),
            "alice"
        );

        let after = t0 + ttl;
        assert!(matches!(
            svc.verify_at(&token, TokenPurpose::Access, after),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn expired_token_via_system_clock() {
        let svc = service();
        let token = svc
            .issue_with_ttl("alice", TokenPurpose::Access, Duration::seconds(-5))
            .unwrap();
        assert!(matches!(
            svc.verify(&token, TokenPurpose::Access),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = service().issue("alice", TokenPurpose::Access).unwrap();
        let other = TokenService::new(TokenConfig::new("other-secret").unwrap());
        assert!(matches!(
            other.verify(&token, TokenPurpose::Access),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        let svc = service();
        assert!(matches!(
            svc.verify("not.a.jwt", TokenPurpose::Access),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            svc.verify("", TokenPurpose::Access),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn algorithm_mismatch_is_invalid() {
        let hs512 = TokenService::new(
            TokenConfig::new("test-secret")
                .unwrap()
                .with_algorithm("HS512")
                .unwrap(),
        );
        let token = hs512.issue("alice", TokenPurpose::Access).unwrap();
        assert!(hs512.verify(&token, TokenPurpose::Access).is_ok());
        assert!(matches!(
            service().verify(&token, TokenPurpose::Access),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn config_rejects_bad_input() {
        assert!(TokenConfig::new("").is_err());
        let cfg = TokenConfig::new("s").unwrap();
        assert!(cfg.clone().with_algorithm("RS256").is_err());
        assert!(cfg.clone().with_algorithm("nope").is_err());
        assert_eq!(
            cfg.with_algorithm("HS384").unwrap().algorithm(),
            Algorithm::HS384
        );
    }

    #[test]
    fn default_ttls_by_purpose() {
        let cfg = TokenConfig::new("s").unwrap();
        assert_eq!(cfg.ttl_for(TokenPurpose::Access), Duration::hours(1));
        assert!(cfg.ttl_for(TokenPurpose::EmailConfirm) >= Duration::hours(24));
        assert!(cfg.ttl_for(TokenPurpose::PasswordReset) >= Duration::hours(24));
    }

    #[test]
    fn oversized_lifetime_is_an_error() {
        let svc = service();
        assert!(matches!(
            svc.issue_with_ttl("alice", TokenPurpose::Access, Duration::MAX),
            Err(AuthError::Internal(_))
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        let cfg = TokenConfig::new("super-secret-value").unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret-value"));
    }
}
