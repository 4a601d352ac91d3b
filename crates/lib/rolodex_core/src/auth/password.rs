//! Password hashing via bcrypt.

use std::sync::LazyLock;

use tracing::{debug, warn};

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Hash a password with bcrypt (cost 10, random salt).
///
/// The returned string carries the algorithm version, cost and salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
///
/// A malformed hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            debug!("bcrypt verify rejected stored hash: {e}");
            false
        }
    }
}

/// Hash checked when the account does not exist, so both outcomes cost one
/// bcrypt verification.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    hash_password("rolodex-dummy-password").unwrap_or_else(|e| {
        warn!("could not prepare dummy password hash: {e}");
        String::new()
    })
});

/// Verify a password against a stored hash that may be missing.
///
/// A missing hash still runs bcrypt against a dummy and returns false.
pub fn verify_password_or_dummy(password: &str, hash: Option<&str>) -> bool {
    match hash {
        Some(hash) => verify_password(password, hash),
        None => {
            let _ = verify_password(password, &DUMMY_HASH);
            false
        }
    }
}
