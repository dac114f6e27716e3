//! Issues individual permission checks to the decision service

use std::{sync::Arc, time::Instant};

use access_review_observe::span_utils::{check_span, record_check_decision};
use access_review_types::{Decision, PermissionRequest, RequestKey};
use tracing::Instrument;

use crate::{checker::AccessChecker, error::Result, metrics::AccessReviewMetrics};

/// Runs exactly one [`AccessChecker`] call per invocation
///
/// A failure is logged here, once, at the point it happens. Callers further
/// up only propagate it.
pub struct CheckExecutor {
    checker: Arc<dyn AccessChecker>,
    metrics: Option<Arc<AccessReviewMetrics>>,
}

impl CheckExecutor {
    pub fn new(checker: Arc<dyn AccessChecker>) -> Self {
        Self { checker, metrics: None }
    }

    /// Attaches metrics collector for observability.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<AccessReviewMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn execute(&self, key: &RequestKey, request: &PermissionRequest) -> Result<Decision> {
        let span = check_span(key.as_str(), &request.verb, &request.resource);

        tracing::info!(key = %key, "Permission cache miss, issuing access review");
        let start = Instant::now();
        let result = self.checker.check_access(request).instrument(span.clone()).await;
        let elapsed = start.elapsed();

        let label = match &result {
            Ok(Decision::Allow) => "allowed",
            Ok(Decision::Deny) => "denied",
            Err(_) => "error",
        };
        record_check_decision(&span, label, elapsed.as_millis());
        if let Some(ref metrics) = self.metrics {
            metrics.record_check(label, elapsed.as_secs_f64());
        }

        if let Err(ref e) = result {
            tracing::error!(
                key = %key,
                error = %e,
                transient = e.is_transient(),
                "Authorization check failed"
            );
        }

        result
    }
}
