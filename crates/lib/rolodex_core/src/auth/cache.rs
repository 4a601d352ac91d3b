//! Username-keyed user cache with TTL-based expiration.
//!
//! `UserCache` sits in front of lookup-by-username on the authentication
//! path. It is never authoritative: writes always go to the user store, and
//! a cache that cannot be reached behaves like an empty one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::auth::AuthenticatedUser;

/// Default lifetime of a cached user: 15 minutes.
pub const DEFAULT_USER_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Errors raised by a cache backend. Never surfaced past `UserCache`.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        CacheError::Unavailable(e.to_string())
    }
}

/// A key/value store with per-key expiry and atomic single-key get/set.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Insert or overwrite `key`, resetting its TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Process-local cache store. Expired entries are dropped lazily on read.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Utc::now();
        let hit = self.entries.get(key).and_then(|entry| {
            if now < entry.expires_at {
                Some(entry.value.clone())
            } else {
                None
            }
        });
        if hit.is_none() {
            self.entries.remove_if(key, |_, entry| now >= entry.expires_at);
        }
        Ok(hit)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| CacheError::Unavailable(format!("ttl {ttl:?} out of range")))?;
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Redis backend
// ---------------------------------------------------------------------------

/// Redis-backed cache store shared by every request of the process.
///
/// `ConnectionManager` multiplexes one connection and reconnects on its own,
/// so clones are cheap and need no external locking.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
}

impl RedisCacheStore {
    /// Connect to Redis at `url` (e.g. `redis://localhost:6379/0`).
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // Redis rejects EX 0; a zero TTL means "do not keep".
        let seconds = ttl.as_secs();
        if seconds == 0 {
            let _: () = conn.del(key).await?;
            return Ok(());
        }
        let _: () = conn.set_ex(key, value, seconds).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// UserCache
// ---------------------------------------------------------------------------

/// Write-through cache of `username → AuthenticatedUser`.
#[derive(Clone)]
pub struct UserCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl UserCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Cache backed by a fresh in-memory store.
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryCacheStore::new()), ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(username: &str) -> String {
        format!("user:{username}")
    }

    /// Look up a cached user. Backend failures and undecodable payloads are
    /// reported as a miss.
    pub async fn get(&self, username: &str) -> Option<AuthenticatedUser> {
        let raw = match self.store.get(&Self::key(username)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(username, error = %e, "user cache read failed; treating as miss");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(username, error = %e, "discarding undecodable user cache entry");
                None
            }
        }
    }

    /// Store `user` under `username` with the default TTL.
    pub async fn put(&self, username: &str, user: &AuthenticatedUser) {
        self.put_with_ttl(username, user, self.ttl).await;
    }

    /// Store `user` under `username`, overwriting any entry and resetting
    /// its TTL. Failures are logged and swallowed.
    pub async fn put_with_ttl(&self, username: &str, user: &AuthenticatedUser, ttl: Duration) {
        let raw = match serde_json::to_string(user) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(username, error = %e, "could not serialize user for cache");
                return;
            }
        };
        match self.store.set(&Self::key(username), &raw, ttl).await {
            Ok(()) => debug!(username, ttl_secs = ttl.as_secs(), "user cached"),
            Err(e) => warn!(username, error = %e, "user cache write failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use uuid::Uuid;

    fn alice() -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::nil(),
            username: "alice".into(),
            email: "alice@x.com".into(),
            avatar: Some("https://example.com/a.png".into()),
            role: UserRole::User,
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn get_returns_none_for_missing_key() {
        let cache = UserCache::in_memory(DEFAULT_USER_CACHE_TTL);
        assert!(cache.get("nobody").await.is_none());
    }

    #[tokio::test]
    async fn oversized_ttl_is_refused_without_panicking() {
        let store = MemoryCacheStore::new();
        for ttl in [Duration::from_secs(1_000_000_000_000_000), Duration::MAX] {
            assert!(store.set("k", "v", ttl).await.is_err());
        }
        assert!(store.is_empty());

        let cache = UserCache::in_memory(Duration::from_secs(1_000_000_000_000_000));
        cache.put("alice", &alice()).await;
        assert!(cache.get("alice").await.is_none());
    }

    #[tokio::test]
    async fn put_and_get_roundtrip() {
        let cache = UserCache::in_memory(DEFAULT_USER_CACHE_TTL);
        cache.put("alice", &alice()).await;
        assert_eq!(cache.get("alice").await, Some(alice()));
    }

    #[tokio::test]
    async fn expired_entry_returns_none() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = UserCache::new(store.clone(), DEFAULT_USER_CACHE_TTL);
        // Zero TTL expires immediately
        cache.put_with_ttl("alice", &alice(), Duration::ZERO).await;
        assert!(cache.get("alice").await.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let cache = UserCache::in_memory(Duration::from_millis(50));
        cache.put("alice", &alice()).await;
        assert!(cache.get("alice").await.is_some());
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.get("alice").await.is_none());
    }

    #[tokio::test]
    async fn put_overwrites_existing_entry() {
        let cache = UserCache::in_memory(DEFAULT_USER_CACHE_TTL);
        cache.put("alice", &alice()).await;
        let mut admin = alice();
        admin.role = UserRole::Admin;
        cache.put("alice", &admin).await;
        assert_eq!(cache.get("alice").await.unwrap().role, UserRole::Admin);
    }

    #[tokio::test]
    async fn broken_backend_is_a_miss() {
        let cache = UserCache::new(Arc::new(BrokenStore), DEFAULT_USER_CACHE_TTL);
        cache.put("alice", &alice()).await;
        assert!(cache.get("alice").await.is_none());
    }

    #[tokio::test]
    async fn garbage_entry_is_a_miss() {
        let store = Arc::new(MemoryCacheStore::new());
        store
            .set("user:alice", "{not json", DEFAULT_USER_CACHE_TTL)
            .await
            .unwrap();
        let cache = UserCache::new(store, DEFAULT_USER_CACHE_TTL);
        assert!(cache.get("alice").await.is_none());
    }
}
