//! Process-local cache of analyzed resources
//!
//! Entries expire after a fixed TTL and are removed lazily on access. At
//! capacity the oldest-inserted entry is evicted (FIFO with TTL, not LRU).

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;
use web_resource::Resource;

/// Default maximum number of live entries
pub const CACHE_SIZE: usize = 128;
/// Default entry lifetime
pub const CACHE_TTL_SECS: u64 = 60 * 60;

struct CacheEntry {
    resource: Arc<Resource>,
    expires_at: DateTime<Utc>,
    seq: u64,
}

/// Map plus insertion order; every operation keeps the two in sync
#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    order: BTreeMap<u64, String>,
    next_seq: u64,
}

impl CacheState {
    fn get(&mut self, key: &str, now: DateTime<Utc>) -> Option<Arc<Resource>> {
        let entry = self.entries.get(key)?;
        if entry.expires_at <= now {
            debug!(key, "Cache entry expired");
            self.remove(key);
            return None;
        }
        Some(entry.resource.clone())
    }

    fn set(&mut self, key: &str, resource: Arc<Resource>, expires_at: DateTime<Utc>, capacity: usize) {
        self.remove(key);
        if capacity == 0 {
            return;
        }
        if self.entries.len() >= capacity {
            if let Some((_, oldest)) = self.order.pop_first() {
                debug!(key = %oldest, "Evicted oldest cache entry");
                self.entries.remove(&oldest);
            }
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.to_string());
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                resource,
                expires_at,
                seq,
            },
        );
    }

    fn remove(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            self.order.remove(&entry.seq);
        }
    }
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Resource cache keyed by URL
///
/// Only `get` and `set` touch the entries, each as one short critical section.
pub struct ResourceCache {
    state: Mutex<CacheState>,
    capacity: usize,
    ttl: TimeDelta,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResourceCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get a live entry, dropping it if it has expired
    pub async fn get(&self, key: &str) -> Option<Arc<Resource>> {
        let resource = self.state.lock().await.get(key, Utc::now());
        let counter = if resource.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        resource
    }

    /// Insert an entry, replacing any entry for the same key
    pub async fn set(&self, key: &str, resource: Arc<Resource>) {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.state
            .lock()
            .await
            .set(key, resource, expires_at, self.capacity);
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.state.lock().await.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new(CACHE_SIZE, Duration::from_secs(CACHE_TTL_SECS))
    }
}
