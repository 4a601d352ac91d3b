//! # rolodex_core
//!
//! Core domain logic for Rolodex: authentication, the user cache, and
//! per-user contacts.

pub mod auth;
pub mod contacts;
pub mod db;
pub mod email;
pub mod migrate;
pub mod models;
pub mod uuid;
pub mod validation;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
