//! Bounded in-memory cache of weather records.
//!
//! Entries expire lazily: an entry older than the TTL is treated as absent
//! (and dropped) when it is looked up. When the cache is full the oldest
//! insertion is evicted.

use crate::record::WeatherRecord;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Maximum number of cached regions.
pub const CACHE_CAPACITY: usize = 256;

struct Entry {
    record: WeatherRecord,
    inserted_at: Instant,
}

/// Thread-safe TTL cache keyed by trimmed region name.
///
/// Lookups use `peek`, so reads never refresh an entry's position and
/// eviction follows insertion order.
pub struct WeatherCache {
    inner: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
}

impl WeatherCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(CACHE_CAPACITY, ttl)
    }

    pub fn with_capacity(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh record for `key`, if any.
    pub async fn get(&self, key: &str) -> Option<WeatherRecord> {
        let mut inner = self.inner.lock().await;
        let entry = inner.peek(key)?;
        if entry.inserted_at.elapsed() <= self.ttl {
            return Some(entry.record.clone());
        }
        log::debug!("[cache] entry for '{}' expired", key);
        inner.pop(key);
        None
    }

    /// Insert or replace the record for `key`, resetting its age.
    pub async fn put(&self, key: &str, record: WeatherRecord) {
        let mut inner = self.inner.lock().await;
        // Pop first so a replaced key moves to the newest position.
        inner.pop(key);
        let entry = Entry {
            record,
            inserted_at: Instant::now(),
        };
        if let Some((evicted, _)) = inner.push(key.to_string(), entry) {
            log::debug!("[cache] evicting '{}'", evicted);
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
