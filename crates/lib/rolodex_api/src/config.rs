//! API server configuration.

use std::time::Duration;

use rolodex_core::auth::AuthError;
use rolodex_core::auth::cache::DEFAULT_USER_CACHE_TTL;
use rolodex_core::auth::jwt::{DEFAULT_ALGORITHM, TokenConfig};
use thiserror::Error;

/// Longest lifetime accepted for any token or cache entry: 10 years.
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Configuration errors raised at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis URL for the user cache; `None` keeps the cache in process.
    pub redis_url: Option<String>,
    /// Base URL used in links sent by email.
    pub public_base_url: String,
    /// Lifetime of cached users.
    pub user_cache_ttl: Duration,
    /// Token signing configuration.
    pub token: TokenConfig,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                          | Default                               |
    /// |-----------------------------------|---------------------------------------|
    /// | `BIND_ADDR`                       | `127.0.0.1:8000`                      |
    /// | `DATABASE_URL`                    | `postgres://localhost:5432/rolodex`   |
    /// | `REDIS_URL`                       | unset (in-process cache)              |
    /// | `PUBLIC_BASE_URL`                 | `http://{BIND_ADDR}`                  |
    /// | `JWT_SECRET`                      | required                              |
    /// | `JWT_ALGORITHM`                   | `HS256`                               |
    /// | `JWT_EXPIRATION_SECONDS`          | `3600`                                |
    /// | `EMAIL_TOKEN_EXPIRATION_SECONDS`  | `604800` (7 days)                     |
    /// | `RESET_TOKEN_EXPIRATION_SECONDS`  | `86400` (24 hours)                    |
    /// | `USER_CACHE_TTL_SECONDS`          | `900`                                 |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8000".into());
        let database_url =
            get("DATABASE_URL").unwrap_or_else(|| "postgres://localhost:5432/rolodex".into());
        let public_base_url =
            get("PUBLIC_BASE_URL").unwrap_or_else(|| format!("http://{bind_addr}"));

        let secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let algorithm = get("JWT_ALGORITHM").unwrap_or_else(|| DEFAULT_ALGORITHM.into());

        let mut token = TokenConfig::new(secret)
            .and_then(|t| t.with_algorithm(&algorithm))
            .map_err(|e| invalid("JWT_ALGORITHM", e))?;
        if let Some(secs) = seconds(&get, "JWT_EXPIRATION_SECONDS")? {
            token = token.with_access_ttl(chrono::Duration::seconds(secs as i64));
        }
        if let Some(secs) = seconds(&get, "EMAIL_TOKEN_EXPIRATION_SECONDS")? {
            token = token.with_email_confirm_ttl(chrono::Duration::seconds(secs as i64));
        }
        if let Some(secs) = seconds(&get, "RESET_TOKEN_EXPIRATION_SECONDS")? {
            token = token.with_password_reset_ttl(chrono::Duration::seconds(secs as i64));
        }

        let user_cache_ttl = seconds(&get, "USER_CACHE_TTL_SECONDS")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_USER_CACHE_TTL);

        Ok(Self {
            bind_addr,
            database_url,
            redis_url: get("REDIS_URL"),
            public_base_url,
            user_cache_ttl,
            token,
        })
    }
}

fn invalid(var: &'static str, e: AuthError) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: e.to_string(),
    }
}

/// Parse an optional number of seconds in `1..=MAX_TTL_SECS`.
fn seconds<G>(get: &G, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(var) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            var,
            reason: "must be greater than zero".into(),
        }),
        Ok(secs) if secs > MAX_TTL_SECS => Err(ConfigError::Invalid {
            var,
            reason: format!("must be at most {MAX_TTL_SECS} seconds"),
        }),
        Ok(secs) => Ok(Some(secs)),
        Err(e) => Err(ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rolodex_core::models::auth::TokenPurpose;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn secret_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("JWT_SECRET"))));
        assert!(matches!(
            load(&[("JWT_SECRET", "  ")]),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
    }

    #[test]
    fn defaults() {
        let cfg = load(&[("JWT_SECRET", "s")]).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8000");
        assert_eq!(cfg.public_base_url, "http://127.0.0.1:8000");
        assert!(cfg.redis_url.is_none());
        assert_eq!(cfg.user_cache_ttl, DEFAULT_USER_CACHE_TTL);
        assert_eq!(
            cfg.token.ttl_for(TokenPurpose::Access),
            chrono::Duration::seconds(3600)
        );
        assert_eq!(format!("{:?}", cfg.token.algorithm()), "HS256");
    }

    #[test]
    fn overrides() {
        let cfg = load(&[
            ("JWT_SECRET", "s"),
            ("JWT_ALGORITHM", "HS512"),
            ("JWT_EXPIRATION_SECONDS", "60"),
            ("RESET_TOKEN_EXPIRATION_SECONDS", "120"),
            ("USER_CACHE_TTL_SECONDS", "30"),
            ("REDIS_URL", "redis://cache:6379/0"),
            ("BIND_ADDR", "0.0.0.0:9000"),
            ("PUBLIC_BASE_URL", "https://contacts.example.com"),
        ])
        .unwrap();
        assert_eq!(format!("{:?}", cfg.token.algorithm()), "HS512");
        assert_eq!(
            cfg.token.ttl_for(TokenPurpose::Access),
            chrono::Duration::seconds(60)
        );
        assert_eq!(
            cfg.token.ttl_for(TokenPurpose::PasswordReset),
            chrono::Duration::seconds(120)
        );
        assert_eq!(cfg.user_cache_ttl, Duration::from_secs(30));
        assert_eq!(cfg.redis_url.as_deref(), Some("redis://cache:6379/0"));
        assert_eq!(cfg.public_base_url, "https://contacts.example.com");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[("JWT_SECRET", "s"), ("JWT_ALGORITHM", "RS256")]),
            Err(ConfigError::Invalid { var: "JWT_ALGORITHM", .. })
        ));
        assert!(matches!(
            load(&[("JWT_SECRET", "s"), ("JWT_EXPIRATION_SECONDS", "soon")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            load(&[("JWT_SECRET", "s"), ("USER_CACHE_TTL_SECONDS", "0")]),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_lifetimes() {
        for var in [
            "JWT_EXPIRATION_SECONDS",
            "EMAIL_TOKEN_EXPIRATION_SECONDS",
            "RESET_TOKEN_EXPIRATION_SECONDS",
            "USER_CACHE_TTL_SECONDS",
        ] {
            for raw in ["1000000000000000", "18446744073709551615"] {
                match load(&[("JWT_SECRET", "s"), (var, raw)]) {
                    Err(ConfigError::Invalid { var: got, .. }) => assert_eq!(got, var),
                    other => panic!("{var}={raw} should be rejected, got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn accepts_the_longest_lifetime() {
        let max = MAX_TTL_SECS.to_string();
        let cfg = load(&[
            ("JWT_SECRET", "s"),
            ("JWT_EXPIRATION_SECONDS", &max),
            ("USER_CACHE_TTL_SECONDS", &max),
        ])
        .unwrap();
        assert_eq!(
            cfg.token.ttl_for(TokenPurpose::Access),
            chrono::Duration::seconds(MAX_TTL_SECS as i64)
        );
        assert_eq!(cfg.user_cache_ttl, Duration::from_secs(MAX_TTL_SECS));
    }
}
