use prometheus::{
    Histogram, IntCounter, IntCounterVec, Registry, register_histogram_with_registry,
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
};

/// Access review metrics for monitoring
#[derive(Clone)]
pub struct AccessReviewMetrics {
    /// Counter for checks issued to the decision service, by result
    pub checks_total: IntCounterVec,

    /// Counter for permission cache lookups, by result
    pub cache_lookups_total: IntCounterVec,

    /// Counter for callers that joined an in-flight check instead of issuing one
    pub coalesced_total: IntCounter,

    /// Counter for finished batches, by outcome
    pub batches_total: IntCounterVec,

    /// Histogram for decision service round-trip duration
    pub check_duration_seconds: Histogram,
}

impl AccessReviewMetrics {
    /// Create a new AccessReviewMetrics instance and register all metrics with the given registry
    ///
    /// # Errors
    ///
    /// Returns an error if any metric fails to register with the registry
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let checks_total = register_int_counter_vec_with_registry!(
            "access_review_checks_total",
            "Total number of permission checks issued to the decision service",
            &["result"],
            registry
        )?;

        let cache_lookups_total = register_int_counter_vec_with_registry!(
            "access_review_cache_lookups_total",
            "Total number of permission cache lookups",
            &["result"],
            registry
        )?;

        let coalesced_total = register_int_counter_with_registry!(
            "access_review_coalesced_total",
            "Total number of callers that joined an in-flight permission check",
            registry
        )?;

        let batches_total = register_int_counter_vec_with_registry!(
            "access_review_batches_total",
            "Total number of finished access review batches",
            &["outcome"],
            registry
        )?;

        let check_duration_seconds = register_histogram_with_registry!(
            "access_review_check_duration_seconds",
            "Duration of permission checks against the decision service in seconds",
            registry
        )?;

        Ok(Self {
            checks_total,
            cache_lookups_total,
            coalesced_total,
            batches_total,
            check_duration_seconds,
        })
    }

    /// Record a completed check ("allowed", "denied", or "error")
    pub fn record_check(&self, result: &str, duration_secs: f64) {
        self.checks_total.with_label_values(&[result]).inc();
        self.check_duration_seconds.observe(duration_secs);
    }

    /// Record a cache lookup
    pub fn record_cache_lookup(&self, hit: bool) {
        let label = if hit { "hit" } else { "miss" };
        self.cache_lookups_total.with_label_values(&[label]).inc();
    }

    /// Record a caller joining an in-flight check
    pub fn record_coalesced(&self) {
        self.coalesced_total.inc();
    }

    /// Record a finished batch ("settled" or "failed")
    pub fn record_batch(&self, outcome: &str) {
        self.batches_total.with_label_values(&[outcome]).inc();
    }
}
