//! In-flight coalescing of permission checks
//!
//! At most one check per [`RequestKey`] is outstanding at any time. The first
//! caller for a key spawns the check; every later caller for the same key gets
//! a clone of the same shared future until the check settles.
//!
//! The check runs as its own task, so it keeps going when every subscriber
//! goes away and still fills the cache for whoever asks next. On success the
//! task writes the cache before it leaves the in-flight map; `acquire`
//! re-checks the cache while holding the in-flight lock, so there is no point
//! at which a key is in neither place and a second check could start. On
//! failure nothing is cached and the key may be acquired again later.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use access_review_cache::PermissionCache;
use access_review_types::{CacheEntry, PermissionRequest, RequestKey};
use futures::{
    FutureExt,
    future::{self, BoxFuture, Shared},
};
use tokio::sync::Mutex;

use crate::{
    error::{CheckError, Result},
    executor::CheckExecutor,
    metrics::AccessReviewMetrics,
};

/// A pending (or already resolved) permission check shared by every caller
/// asking the same question
pub type PendingCheck = Shared<BoxFuture<'static, Result<CacheEntry>>>;

type InFlightMap = Arc<Mutex<HashMap<RequestKey, PendingCheck>>>;

pub struct InFlightCoalescer {
    cache: Arc<PermissionCache>,
    executor: Arc<CheckExecutor>,
    in_flight: InFlightMap,
    issued: AtomicU64,
    joined: AtomicU64,
    metrics: Option<Arc<AccessReviewMetrics>>,
}

impl InFlightCoalescer {
    pub fn new(cache: Arc<PermissionCache>, executor: Arc<CheckExecutor>) -> Self {
        Self {
            cache,
            executor,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            issued: AtomicU64::new(0),
            joined: AtomicU64::new(0),
            metrics: None,
        }
    }

    /// Attaches metrics collector for observability.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<AccessReviewMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Get the shared check for `key`, starting one if none is in flight
    ///
    /// Must be called from within a tokio runtime.
    pub async fn acquire(&self, key: &RequestKey, request: &PermissionRequest) -> PendingCheck {
        let mut in_flight = self.in_flight.lock().await;

        if let Some(pending) = in_flight.get(key) {
            self.joined.fetch_add(1, Ordering::Relaxed);
            if let Some(ref metrics) = self.metrics {
                metrics.record_coalesced();
            }
            tracing::debug!(key = %key, "Joining in-flight permission check");
            return pending.clone();
        }

        // Settled between the caller's cache lookup and taking the lock
        if let Some(entry) = self.cache.peek(key).await {
            return future::ready(Ok(entry)).boxed().shared();
        }

        self.issued.fetch_add(1, Ordering::Relaxed);
        let pending = self.spawn_check(key.clone(), request.clone());
        in_flight.insert(key.clone(), pending.clone());
        pending
    }

    fn spawn_check(&self, key: RequestKey, request: PermissionRequest) -> PendingCheck {
        let cache = Arc::clone(&self.cache);
        let executor = Arc::clone(&self.executor);
        let mut guard = InFlightGuard::new(key.clone(), Arc::clone(&self.in_flight));
        let failed_key = key.clone();

        // Removal takes the in-flight lock, which `acquire` holds until the
        // new entry is inserted.
        let task = tokio::spawn(async move {
            let outcome = match executor.execute(&key, &request).await {
                Ok(decision) => {
                    let entry = CacheEntry::new(request, decision);
                    Ok(cache.store(key.clone(), entry).await)
                },
                Err(e) => Err(e),
            };
            guard.release().await;
            outcome
        });

        task.map(move |joined| match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                let error = CheckError::Aborted(e.to_string());
                tracing::error!(
                    key = %failed_key,
                    error = %error,
                    panicked = e.is_panic(),
                    "Authorization check failed"
                );
                Err(error)
            },
        })
        .boxed()
        .shared()
    }

    /// Whether a check for `key` is currently outstanding
    pub async fn is_in_flight(&self, key: &RequestKey) -> bool {
        self.in_flight.lock().await.contains_key(key)
    }

    /// Number of checks currently outstanding
    pub async fn in_flight_count(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    /// Number of checks this coalescer has started
    pub fn issued_count(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    /// Number of callers that joined an outstanding check
    pub fn joined_count(&self) -> u64 {
        self.joined.load(Ordering::Relaxed)
    }
}

/// Removes a key from the in-flight map when its check settles
///
/// If the check task is torn down before settling (panic, runtime shutdown),
/// the drop path schedules the removal so the key can be retried.
struct InFlightGuard {
    key: RequestKey,
    in_flight: InFlightMap,
    armed: bool,
}

impl InFlightGuard {
    fn new(key: RequestKey, in_flight: InFlightMap) -> Self {
        Self { key, in_flight, armed: true }
    }

    async fn release(&mut self) {
        self.in_flight.lock().await.remove(&self.key);
        self.armed = false;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        tracing::warn!(key = %self.key, "Permission check torn down before settling");
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let key = self.key.clone();
            let in_flight = Arc::clone(&self.in_flight);
            runtime.spawn(async move {
                in_flight.lock().await.remove(&key);
            });
        }
    }
}
