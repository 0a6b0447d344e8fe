//! Read-through cache for collection listings
//!
//! A listing is computed from the store on a miss and kept for a fixed TTL.
//! Every write to the collection invalidates it. A generation counter makes
//! sure a computation that overlapped an invalidation is not stored, so a
//! snapshot older than the latest mutation is never served.
//!
//! Uses the moka crate for thread-safe, async-compatible caching with TTL.

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use utoipa::ToSchema;

use crate::config::CacheConfig;

// ============================================================================
// Read-Through Cache
// ============================================================================

/// Read-through cache keyed by collection
#[derive(Clone)]
pub struct ReadThroughCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    cache: Cache<K, V>,
    generation: Arc<RwLock<u64>>,
    stats: Arc<CacheStats>,
}

impl<K, V> ReadThroughCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache whose entries live for `ttl`
    pub fn new(name: impl Into<String>, ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self {
            cache,
            generation: Arc::new(RwLock::new(0)),
            stats: Arc::new(CacheStats::new(name)),
        }
    }

    /// Create from the application cache settings
    pub fn with_config(name: impl Into<String>, config: &CacheConfig) -> Self {
        Self::new(
            name,
            Duration::from_secs(config.client_list_ttl_secs),
            config.max_capacity,
        )
    }

    /// Return the cached value for `key`, computing and storing it on a miss
    ///
    /// A failing `compute` stores nothing and its error is returned as is.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.cache.get(&key).await {
            self.stats.record_hit();
            debug!(cache = %self.stats.name(), ?key, "Cache hit");
            return Ok(value);
        }

        self.stats.record_miss();
        debug!(cache = %self.stats.name(), ?key, "Cache miss");

        let generation = *self.generation.read().await;
        let value = compute().await?;

        // Holding the read guard keeps invalidate() out until the insert is done
        let current = self.generation.read().await;
        if *current == generation {
            self.cache.insert(key, value.clone()).await;
            self.stats.record_write();
        } else {
            debug!(cache = %self.stats.name(), ?key, "Discarding result computed across an invalidation");
        }

        Ok(value)
    }

    /// Drop the snapshot for `key`
    pub async fn invalidate(&self, key: &K) {
        let mut generation = self.generation.write().await;
        *generation = generation.wrapping_add(1);
        self.cache.invalidate(key).await;
        self.stats.record_invalidation();
        debug!(cache = %self.stats.name(), ?key, "Cache invalidated");
    }

    /// Get cache statistics
    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    /// Get current cache size
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

// ============================================================================
// Cache Statistics
// ============================================================================

/// Statistics for cache performance monitoring
#[derive(Debug)]
pub struct CacheStats {
    /// Cache name for identification
    name: String,
    /// Total number of cache hits
    hits: AtomicU64,
    /// Total number of cache misses
    misses: AtomicU64,
    /// Total number of cache writes
    writes: AtomicU64,
    /// Total number of invalidations
    invalidations: AtomicU64,
}

impl CacheStats {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }

    /// Hit rate (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    /// Get a summary report
    pub fn report(&self) -> CacheStatsReport {
        CacheStatsReport {
            name: self.name.clone(),
            hits: self.hits(),
            misses: self.misses(),
            writes: self.writes(),
            invalidations: self.invalidations(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// Serializable cache statistics report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CacheStatsReport {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub invalidations: u64,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}
