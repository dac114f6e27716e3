//! Batch evaluation of permission requests
//!
//! [`BatchCoordinator::evaluate`] returns immediately with a [`BatchHandle`]
//! reporting `pending=true` and no results. A spawned driver then resolves the
//! batch's distinct keys against the cache and the in-flight coalescer and
//! publishes the aggregate whenever it changes:
//!
//! ```text
//! Pending ──every key resolved──▶ Settled (results in input order)
//!    │
//!    └──────any key failed──────▶ Failed  (no results, fail-closed)
//! ```
//!
//! Outcomes that are already available when the driver wakes are folded into a
//! single update, and an update that would not change the aggregate is never
//! published.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use access_review_cache::PermissionCache;
use access_review_observe::span_utils::{batch_span, record_batch_outcome};
use access_review_types::{PermissionRequest, PermissionResult, RequestKey};
use futures::{FutureExt, StreamExt, stream::FuturesUnordered};
use tokio::{
    sync::watch,
    task::{self, JoinHandle},
};
use tracing::{Instrument, Span};

use crate::{coalescer::InFlightCoalescer, error::CheckError, metrics::AccessReviewMetrics};

/// The aggregate view of one batch
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchState {
    /// Resolved requests in input order. Partial while pending, empty on failure
    pub results: Vec<PermissionResult>,
    pub pending: bool,
}

impl BatchState {
    fn pending() -> Self {
        Self { results: Vec::new(), pending: true }
    }

    /// Whether `request` is in the results with `allowed=true`
    ///
    /// Unresolved and failed requests are not allowed.
    pub fn is_allowed(&self, request: &PermissionRequest) -> bool {
        self.results.iter().any(|result| result.allowed && &result.request == request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Pending,
    Settled,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    state: BatchState,
    phase: BatchPhase,
    failure: Option<CheckError>,
}

impl Snapshot {
    fn pending() -> Self {
        Self { state: BatchState::pending(), phase: BatchPhase::Pending, failure: None }
    }
}

/// Caller-facing entry point for permission checks
#[derive(Clone)]
pub struct BatchCoordinator {
    cache: Arc<PermissionCache>,
    coalescer: Arc<InFlightCoalescer>,
    metrics: Option<Arc<AccessReviewMetrics>>,
}

impl BatchCoordinator {
    pub fn new(cache: Arc<PermissionCache>, coalescer: Arc<InFlightCoalescer>) -> Self {
        Self { cache, coalescer, metrics: None }
    }

    /// Attaches metrics collector for observability.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<AccessReviewMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Start evaluating a batch of requests
    ///
    /// Never blocks. Must be called from within a tokio runtime.
    pub fn evaluate(&self, requests: Vec<PermissionRequest>) -> BatchHandle {
        let (tx, rx) = watch::channel(Snapshot::pending());
        let span = batch_span(requests.len());

        let driver = BatchDriver {
            requests: requests.clone(),
            cache: Arc::clone(&self.cache),
            coalescer: Arc::clone(&self.coalescer),
            metrics: self.metrics.clone(),
            tx,
            span: span.clone(),
        };
        tokio::spawn(driver.run().instrument(span));

        BatchHandle { requests, rx }
    }
}

/// Resolves one batch and publishes its aggregate
struct BatchDriver {
    requests: Vec<PermissionRequest>,
    cache: Arc<PermissionCache>,
    coalescer: Arc<InFlightCoalescer>,
    metrics: Option<Arc<AccessReviewMetrics>>,
    tx: watch::Sender<Snapshot>,
    span: Span,
}

impl BatchDriver {
    async fn run(self) {
        tokio::select! {
            // Dropping the driver's futures releases its shared-check clones;
            // the checks themselves keep running.
            _ = self.tx.closed() => {
                tracing::debug!("Access review batch abandoned before settling");
            },
            _ = self.drive() => {},
        }
    }

    async fn drive(&self) {
        let keys: Vec<RequestKey> = self.requests.iter().map(RequestKey::from).collect();
        let mut resolved: HashMap<RequestKey, bool> = HashMap::new();
        let mut waiting = FuturesUnordered::new();
        let mut seen = HashSet::new();

        for (key, request) in keys.iter().zip(&self.requests) {
            if !seen.insert(key) {
                continue;
            }

            let cached = self.cache.lookup(key).await;
            if let Some(ref metrics) = self.metrics {
                metrics.record_cache_lookup(cached.is_some());
            }
            if let Some(entry) = cached {
                tracing::debug!(key = %key, allowed = entry.allowed(), "Permission cache hit");
                resolved.insert(key.clone(), entry.allowed());
                continue;
            }

            let pending = self.coalescer.acquire(key, request).await;
            let key = key.clone();
            waiting.push(async move { (key, pending.await) });
        }
        self.span.record("distinct", seen.len());

        self.publish_progress(&keys, &resolved, waiting.is_empty());

        while let Some(first) = waiting.next().await {
            // Draining must not spend the coop budget, or a large wave of
            // completions would be cut into several updates.
            let mut settled = vec![first];
            while let Some(Some(next)) = task::unconstrained(waiting.next()).now_or_never() {
                settled.push(next);
            }

            for (key, outcome) in settled {
                match outcome {
                    Ok(entry) => {
                        resolved.insert(key, entry.allowed());
                    },
                    Err(error) => {
                        self.fail(&key, error);
                        return;
                    },
                }
            }

            self.publish_progress(&keys, &resolved, waiting.is_empty());
        }
    }

    fn publish_progress(
        &self,
        keys: &[RequestKey],
        resolved: &HashMap<RequestKey, bool>,
        done: bool,
    ) {
        let results = keys
            .iter()
            .zip(&self.requests)
            .filter_map(|(key, request)| {
                resolved.get(key).map(|allowed| PermissionResult::new(request.clone(), *allowed))
            })
            .collect();

        let phase = if done { BatchPhase::Settled } else { BatchPhase::Pending };
        if done {
            tracing::debug!(requests = self.requests.len(), "Access review batch settled");
            record_batch_outcome(&self.span, "settled");
            if let Some(ref metrics) = self.metrics {
                metrics.record_batch("settled");
            }
        }

        let state = BatchState { results, pending: !done };
        self.publish(Snapshot { state, phase, failure: None });
    }

    fn fail(&self, key: &RequestKey, error: CheckError) {
        // The error itself was logged where the check failed
        tracing::warn!(failed_key = %key, "Access review batch failed; granting nothing");
        record_batch_outcome(&self.span, "failed");
        if let Some(ref metrics) = self.metrics {
            metrics.record_batch("failed");
        }

        self.publish(Snapshot {
            state: BatchState { results: Vec::new(), pending: false },
            phase: BatchPhase::Failed,
            failure: Some(error),
        });
    }

    fn publish(&self, snapshot: Snapshot) {
        self.tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}

/// A caller's view of one batch
///
/// Dropping every handle (and every [`Subscription`] made from them) before the
/// batch settles stops the batch. Checks it started keep running and still
/// fill the cache.
#[derive(Debug, Clone)]
pub struct BatchHandle {
    requests: Vec<PermissionRequest>,
    rx: watch::Receiver<Snapshot>,
}

impl BatchHandle {
    /// The input this batch was started with
    pub fn requests(&self) -> &[PermissionRequest] {
        &self.requests
    }

    /// Best currently-known aggregate
    pub fn state(&self) -> BatchState {
        self.rx.borrow().state.clone()
    }

    pub fn phase(&self) -> BatchPhase {
        self.rx.borrow().phase
    }

    /// The error that failed the batch, for diagnostics
    pub fn failure(&self) -> Option<CheckError> {
        self.rx.borrow().failure.clone()
    }

    /// Wait for the next aggregate change
    ///
    /// Returns `None` once the batch is finished and its final state has been
    /// observed.
    pub async fn next_state(&mut self) -> Option<BatchState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().state.clone())
    }

    /// Wait until the batch is settled or failed
    pub async fn settled(&mut self) -> BatchState {
        if let Ok(snapshot) = self.rx.wait_for(|s| s.phase != BatchPhase::Pending).await {
            return snapshot.state.clone();
        }
        // Driver gone without finishing (runtime shutdown)
        self.rx.borrow().state.clone()
    }

    /// Call `callback` with the current state and on every change
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&BatchState) + Send + 'static,
    {
        let project = |snapshot: &Snapshot| snapshot.state.clone();
        Subscription::spawn(self.rx.clone(), project, callback)
    }
}

/// A registered state-change callback
///
/// Dropping it unsubscribes. Other subscribers and the underlying checks are
/// unaffected.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn spawn<T, P, F>(mut rx: watch::Receiver<T>, project: P, mut callback: F) -> Self
    where
        T: Send + Sync + 'static,
        P: Fn(&T) -> BatchState + Send + 'static,
        F: FnMut(&BatchState) + Send + 'static,
    {
        let task = tokio::spawn(async move {
            loop {
                let state = project(&*rx.borrow_and_update());
                callback(&state);
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });
        Self { task }
    }

    /// Whether the source finished and no further callbacks will fire
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
