// src/services/cache.rs
// DOCUMENTATION: In-memory TTL cache for serialized JSON responses
// PURPOSE: Absorb repeated listing searches and dashboard reads

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Cached {
    body: String,
    expires_at: Instant,
}

impl Cached {
    fn is_live(&self, now: Instant) -> bool {
        now <= self.expires_at
    }
}

/// Response cache keyed by namespaced strings
/// DOCUMENTATION: Keys look like "gear:search:<query>" or "dashboard:<user>";
/// writes drop a whole namespace with `invalidate_prefix`
pub struct ResponseCache {
    entries: RwLock<HashMap<String, Cached>>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl: Duration::from_secs(ttl_seconds),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn dashboard_key(user_id: uuid::Uuid) -> String {
        format!("dashboard:{}", user_id)
    }

    /// Live body for `key`; expired entries count as misses and are left for cleanup
    pub async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let found = self
            .entries
            .read()
            .await
            .get(key)
            .filter(|cached| cached.is_live(now))
            .map(|cached| cached.body.clone());

        match found {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                log::debug!("Cache hit: {}", key);
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                log::debug!("Cache miss: {}", key);
            }
        }
        found
    }

    pub async fn set(&self, key: String, value: String) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    pub async fn set_with_ttl(&self, key: String, value: String, ttl: Duration) {
        let cached = Cached {
            body: value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key, cached);
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Drop every key starting with `prefix`; returns how many were removed
    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));

        let removed = before - entries.len();
        if removed > 0 {
            log::debug!("Invalidated {} cached responses under '{}'", removed, prefix);
        }
        removed
    }

    /// Remove expired entries; returns how many were dropped
    pub async fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, cached| cached.is_live(now));

        let dropped = before - entries.len();
        if dropped > 0 {
            log::info!("Response cache: dropped {} expired, {} kept", dropped, entries.len());
        }
        dropped
    }

    pub async fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.read().await;

        let mut namespaces = BTreeMap::new();
        let mut live = 0;
        for (key, cached) in entries.iter() {
            if cached.is_live(now) {
                live += 1;
            }
            let namespace = key.split(':').next().unwrap_or_default();
            *namespaces.entry(namespace.to_string()).or_insert(0) += 1;
        }

        CacheStats {
            entries: entries.len(),
            live,
            expired: entries.len() - live,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            namespaces,
        }
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        log::info!("Response cache cleared ({} entries)", entries.len());
        entries.clear();
    }
}

/// Snapshot reported by GET /admin/stats
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub live: usize,
    pub expired: usize,
    pub hits: u64,
    pub misses: u64,
    /// Entry count per key namespace ("gear", "dashboard")
    pub namespaces: BTreeMap<String, usize>,
}

/// Periodically sweep expired entries
pub fn start_cleanup_task(cache: Arc<ResponseCache>, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));
        loop {
            ticker.tick().await;
            cache.cleanup().await;
        }
    });
}
