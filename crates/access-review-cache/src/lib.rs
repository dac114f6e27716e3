//! # Access Review Cache - Permission Cache
//!
//! Remembers resolved permission checks so each distinct question reaches the
//! authorization service at most once per process lifetime.
//!
//! Entries are write-once: storing a key that is already present keeps the
//! original entry. By default nothing is ever evicted; an operator may opt
//! into a capacity bound or a TTL with [`PermissionCache::with_limits`], at the
//! cost of re-checking keys once they age out.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use access_review_types::{CacheEntry, RequestKey};
use moka::future::Cache;

/// In-memory cache of resolved permission checks
pub struct PermissionCache {
    entries: Cache<RequestKey, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl PermissionCache {
    /// Create an unbounded cache that never evicts
    pub fn new() -> Self {
        Self::with_limits(None, None)
    }

    /// Create a cache with an optional capacity bound and time-to-live
    pub fn with_limits(max_capacity: Option<u64>, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::<RequestKey, CacheEntry>::builder();
        if let Some(max_capacity) = max_capacity {
            builder = builder.max_capacity(max_capacity);
        }
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            entries: builder.build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Look up a resolved check, recording a hit or a miss
    pub async fn lookup(&self, key: &RequestKey) -> Option<CacheEntry> {
        let result = self.entries.get(key).await;
        if result.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// Look up a resolved check without touching the statistics
    pub async fn peek(&self, key: &RequestKey) -> Option<CacheEntry> {
        self.entries.get(key).await
    }

    /// Store a resolved check
    ///
    /// A no-op when the key is already cached. Returns the entry that is in the
    /// cache afterwards, which is the earlier one if there was one.
    pub async fn store(&self, key: RequestKey, entry: CacheEntry) -> CacheEntry {
        let stored = self.entries.entry(key).or_insert(entry).await;
        if stored.is_fresh() {
            tracing::debug!(
                key = %stored.key(),
                allowed = stored.value().allowed(),
                "Cached permission check"
            );
        }
        stored.into_value()
    }

    /// Drop every cached decision
    ///
    /// Never called by the coordination layer itself. Exposed for hosts that
    /// know the current user's roles changed and accept the burst of re-checks.
    pub fn invalidate_all(&self) {
        let count = self.entries.entry_count();
        self.entries.invalidate_all();
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(cached_checks = count, "Cleared all cached permission checks");
    }

    /// Get cache statistics
    ///
    /// `entry_count` is eventually consistent; call [`sync`](Self::sync) first
    /// when an exact count matters.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);

        let total_requests = hits + misses;
        let hit_rate =
            if total_requests > 0 { (hits as f64 / total_requests as f64) * 100.0 } else { 0.0 };

        CacheStats {
            entry_count: self.entries.entry_count(),
            hits,
            misses,
            hit_rate,
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }

    /// Run pending housekeeping so entry counts are exact
    pub async fn sync(&self) {
        self.entries.run_pending_tasks().await;
    }
}

impl Default for PermissionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entry_count: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub invalidations: u64,
}
