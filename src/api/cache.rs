//! Response cache with per-endpoint hit statistics
//!
//! The legacy deployment cached rendered responses in Redis with a TTL per
//! route and kept hit/miss counters in Redis hashes behind
//! `/api/cache/stats`. Here the cache is an in-process `moka` cache with a
//! per-entry TTL, and the counters are plain atomics.

use moka::future::Cache;
use moka::Expiry;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// TTL for single-title detail responses
pub const TTL_DETAIL: Duration = Duration::from_secs(2 * 3600);
/// TTL for paged list responses (popular, trending, ...)
pub const TTL_LIST: Duration = Duration::from_secs(4 * 3600);
/// TTL for rarely-changing responses (collections, credits, seasons)
pub const TTL_LONG: Duration = Duration::from_secs(24 * 3600);
/// TTL for discover queries
pub const TTL_DISCOVER: Duration = Duration::from_secs(3600);

/// A cached response body together with its time-to-live
#[derive(Clone)]
struct CachedValue {
    body: Arc<Value>,
    ttl: Duration,
}

struct PerEntryExpiry;

impl Expiry<String, CachedValue> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

#[derive(Default)]
struct EndpointCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// In-process response cache with per-endpoint hit/miss counters
pub struct ResponseCache {
    cache: Cache<String, CachedValue>,
    stats: Mutex<HashMap<String, Arc<EndpointCounters>>>,
}

impl ResponseCache {
    /// Create a cache bounded to `max_capacity` entries
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryExpiry)
            .build();

        Self {
            cache,
            stats: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a cached response body
    pub async fn get(&self, key: &str) -> Option<Arc<Value>> {
        self.cache.get(key).await.map(|v| v.body)
    }

    /// Store a response body under `key` for `ttl`
    pub async fn insert(&self, key: String, body: Value, ttl: Duration) {
        self.cache
            .insert(
                key,
                CachedValue {
                    body: Arc::new(body),
                    ttl,
                },
            )
            .await;
    }

    /// Record a cache hit or miss for an endpoint
    pub fn record(&self, endpoint: &str, hit: bool) {
        let counters = {
            let mut stats = match self.stats.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            stats.entry(endpoint.to_string()).or_default().clone()
        };
        if hit {
            counters.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            counters.misses.fetch_add(1, Ordering::Relaxed);
        }
        debug!("Recorded cache stats for {endpoint}: hit={hit}");
    }

    /// Per-endpoint statistics in the shape `/api/cache/stats` serves
    #[must_use]
    pub fn stats_snapshot(&self) -> Value {
        let stats = match self.stats.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut out = serde_json::Map::new();
        for (endpoint, counters) in stats.iter() {
            let hits = counters.hits.load(Ordering::Relaxed);
            let misses = counters.misses.load(Ordering::Relaxed);
            let total = hits + misses;
            #[allow(clippy::cast_precision_loss)]
            let hit_ratio = if total > 0 {
                (hits as f64 / total as f64 * 10_000.0).round() / 100.0
            } else {
                0.0
            };
            out.insert(
                endpoint.clone(),
                json!({
                    "hits": hits,
                    "misses": misses,
                    "total": total,
                    "hit_ratio": hit_ratio,
                }),
            );
        }
        Value::Object(out)
    }

    /// Current number of cached entries (for monitoring)
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = ResponseCache::new(100);
        assert!(cache.get("movie_603").await.is_none());

        cache
            .insert("movie_603".to_string(), json!({"title": "The Matrix"}), TTL_DETAIL)
            .await;

        let body = cache.get("movie_603").await.expect("cached");
        assert_eq!(body["title"], "The Matrix");
    }

    #[tokio::test]
    async fn per_entry_ttl_expires() {
        let cache = ResponseCache::new(100);
        cache
            .insert(
                "short".to_string(),
                json!(1),
                Duration::from_millis(50),
            )
            .await;
        cache
            .insert("long".to_string(), json!(2), TTL_LONG)
            .await;

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get("short").await.is_none());
        assert!(cache.get("long").await.is_some());
    }

    #[tokio::test]
    async fn stats_counters_and_ratio() {
        let cache = ResponseCache::new(100);
        cache.record("movie/603", false);
        cache.record("movie/603", true);
        cache.record("movie/603", true);
        cache.record("movie/popular/page/1", false);

        let snapshot = cache.stats_snapshot();
        let movie = &snapshot["movie/603"];
        assert_eq!(movie["hits"], 2);
        assert_eq!(movie["misses"], 1);
        assert_eq!(movie["total"], 3);
        assert_eq!(movie["hit_ratio"], 66.67);

        assert_eq!(snapshot["movie/popular/page/1"]["hit_ratio"], 0.0);
    }
}
