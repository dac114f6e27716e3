//! Wiring for the access review pipeline
//!
//! [`AccessReview`] owns one cache and one in-flight coalescer and hands out
//! batches and gates that share them. Clone it freely; every clone sees the
//! same cache and in-flight map.
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use access_review_core::{AccessReview, HttpAccessChecker};
//! use access_review_types::PermissionRequest;
//!
//! # async fn run() -> access_review_core::Result<()> {
//! let checker =
//!     HttpAccessChecker::new("https://kubernetes.default.svc", None, Duration::from_secs(10))?;
//! let review = AccessReview::builder().checker(Arc::new(checker)).build();
//!
//! let mut batch = review.evaluate(vec![
//!     PermissionRequest::builder().resource("pods").namespace("default").verb("delete").build(),
//! ]);
//! let state = batch.settled().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use access_review_cache::PermissionCache;
use access_review_config::{Config, validation};
use access_review_types::PermissionRequest;

use crate::{
    batch::{BatchCoordinator, BatchHandle},
    checker::AccessChecker,
    coalescer::InFlightCoalescer,
    error::SetupError,
    executor::CheckExecutor,
    gate::PermissionGate,
    http::HttpAccessChecker,
    metrics::AccessReviewMetrics,
};

#[derive(Clone)]
pub struct AccessReview {
    cache: Arc<PermissionCache>,
    coalescer: Arc<InFlightCoalescer>,
    coordinator: BatchCoordinator,
}

#[bon::bon]
impl AccessReview {
    /// Assemble the pipeline around `checker`
    ///
    /// Without a `cache` an unbounded, never-expiring one is created.
    #[builder]
    pub fn new(
        checker: Arc<dyn AccessChecker>,
        cache: Option<Arc<PermissionCache>>,
        metrics: Option<Arc<AccessReviewMetrics>>,
    ) -> Self {
        let cache = cache.unwrap_or_default();

        let mut executor = CheckExecutor::new(checker);
        if let Some(ref metrics) = metrics {
            executor = executor.with_metrics(Arc::clone(metrics));
        }

        let mut coalescer = InFlightCoalescer::new(Arc::clone(&cache), Arc::new(executor));
        if let Some(ref metrics) = metrics {
            coalescer = coalescer.with_metrics(Arc::clone(metrics));
        }
        let coalescer = Arc::new(coalescer);

        let mut coordinator = BatchCoordinator::new(Arc::clone(&cache), Arc::clone(&coalescer));
        if let Some(metrics) = metrics {
            coordinator = coordinator.with_metrics(metrics);
        }

        Self { cache, coalescer, coordinator }
    }
}

impl AccessReview {
    /// Build the pipeline from configuration, checking against the API server
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        validation::validate(config)?;

        let checker = HttpAccessChecker::from_config(&config.checker)?;
        let cache = PermissionCache::with_limits(
            config.cache.max_capacity,
            config.cache.ttl_duration(),
        );

        tracing::info!(
            base_url = %config.checker.base_url,
            max_capacity = ?config.cache.max_capacity,
            ttl_seconds = ?config.cache.ttl,
            "Access review pipeline configured"
        );

        Ok(Self::builder().checker(Arc::new(checker)).cache(Arc::new(cache)).build())
    }

    /// Start evaluating a batch of requests
    ///
    /// See [`BatchCoordinator::evaluate`].
    pub fn evaluate(&self, requests: Vec<PermissionRequest>) -> BatchHandle {
        self.coordinator.evaluate(requests)
    }

    /// Create a long-lived gate over `requests`
    pub fn gate(&self, requests: Vec<PermissionRequest>) -> PermissionGate {
        PermissionGate::new(self.coordinator.clone(), requests)
    }

    pub fn coordinator(&self) -> &BatchCoordinator {
        &self.coordinator
    }

    pub fn cache(&self) -> &Arc<PermissionCache> {
        &self.cache
    }

    pub fn coalescer(&self) -> &Arc<InFlightCoalescer> {
        &self.coalescer
    }
}
