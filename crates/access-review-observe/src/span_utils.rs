//! Span creation utilities for access review operations
//!
//! Keeps span names and attributes consistent between the executor and the
//! batch coordinator.

use tracing::{Level, Span, span};

/// Create a span for a single permission check against the decision service
pub fn check_span(key: &str, verb: &str, resource: &str) -> Span {
    span!(
        Level::INFO,
        "permission_check",
        key = key,
        verb = verb,
        resource = resource,
        decision = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    )
}

/// Create a span for one batch evaluation
pub fn batch_span(requests: usize) -> Span {
    span!(
        Level::DEBUG,
        "access_review_batch",
        requests = requests,
        distinct = tracing::field::Empty,
        outcome = tracing::field::Empty,
    )
}

/// Record decision in a check span
pub fn record_check_decision(span: &Span, decision: &str, duration_ms: u128) {
    span.record("decision", decision);
    span.record("duration_ms", duration_ms);
}

/// Record the final outcome of a batch
pub fn record_batch_outcome(span: &Span, outcome: &str) {
    span.record("outcome", outcome);
}
