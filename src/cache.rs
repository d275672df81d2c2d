use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;

use crate::Result;

/// Key/value store with per-entry TTL consulted by the fetch pipeline.
///
/// Treated as best-effort: a `get` miss falls through to the network, and a
/// `set` failure never aborts the call.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the cached content for `key`, or `None` on a miss.
    ///
    /// Backend failures are reported as a miss.
    async fn get(&self, key: &str) -> Option<Bytes>;

    /// Stores `content` under `key`. A zero `ttl` means the entry never
    /// expires.
    async fn set(&self, key: &str, content: Bytes, ttl: Duration) -> Result<()>;
}

/// In-memory [`Cache`] with lazy expiry.
///
/// Expired entries are removed when they are next looked up.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

#[derive(Debug)]
struct MemoryEntry {
    content: Bytes,
    expires_at: Option<Instant>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, MemoryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Bytes> {
        let mut entries = self.lock();
        let expired = entries
            .get(key)
            .is_some_and(|entry| entry.expires_at.is_some_and(|at| at <= Instant::now()));
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.content.clone())
    }

    async fn set(&self, key: &str, content: Bytes, ttl: Duration) -> Result<()> {
        let expires_at = (!ttl.is_zero()).then(|| Instant::now() + ttl);
        self.lock()
            .insert(key.to_owned(), MemoryEntry { content, expires_at });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;

    use crate::{Cache, MemoryCache};

    #[tokio::test]
    async fn round_trips_content_before_expiry() {
        let cache = MemoryCache::new();
        cache
            .set("key", Bytes::from_static(b"content"), Duration::from_secs(60))
            .await
            .expect("set must succeed");
        assert_eq!(cache.get("key").await, Some(Bytes::from_static(b"content")));
    }

    #[tokio::test]
    async fn misses_after_expiry() {
        let cache = MemoryCache::new();
        cache
            .set("key", Bytes::from_static(b"content"), Duration::from_millis(10))
            .await
            .expect("set must succeed");
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("key").await, None);
    }

    #[tokio::test]
    async fn zero_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache
            .set("key", Bytes::from_static(b"content"), Duration::ZERO)
            .await
            .expect("set must succeed");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("key").await, Some(Bytes::from_static(b"content")));
    }

    #[tokio::test]
    async fn missing_key_is_a_miss() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("absent").await, None);
    }
}
