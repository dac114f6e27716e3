//! Scriptable [`AccessChecker`] for tests
//!
//! Outcomes are configured per request, with a fallback for everything else.
//! A gated checker holds every call until [`MockChecker::open_gate`], which is
//! how tests keep checks in flight while they arrange concurrent callers.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use access_review_core::{AccessChecker, CheckError, Result};
use access_review_types::{Decision, PermissionRequest, RequestKey};
use async_trait::async_trait;
use tokio::sync::watch;

/// What the mock answers for a request
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Allow,
    Deny,
    Fail(CheckError),
    /// Panic inside the check
    Panic,
}

impl MockOutcome {
    fn resolve(&self) -> Result<Decision> {
        match self {
            MockOutcome::Allow => Ok(Decision::Allow),
            MockOutcome::Deny => Ok(Decision::Deny),
            MockOutcome::Fail(e) => Err(e.clone()),
            MockOutcome::Panic => panic!("mock checker panicked"),
        }
    }
}

pub struct MockChecker {
    outcomes: HashMap<RequestKey, MockOutcome>,
    fallback: MockOutcome,
    calls: Mutex<Vec<PermissionRequest>>,
    open: watch::Sender<bool>,
    started: watch::Sender<usize>,
}

impl MockChecker {
    /// A checker that allows everything immediately
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
            fallback: MockOutcome::Allow,
            calls: Mutex::new(Vec::new()),
            open: watch::Sender::new(true),
            started: watch::Sender::new(0),
        }
    }

    /// Answer `outcome` for `request`
    pub fn with_outcome(mut self, request: &PermissionRequest, outcome: MockOutcome) -> Self {
        self.outcomes.insert(request.key(), outcome);
        self
    }

    /// Answer `outcome` for requests without a specific outcome
    pub fn with_fallback(mut self, outcome: MockOutcome) -> Self {
        self.fallback = outcome;
        self
    }

    /// Hold every call until the gate is opened
    pub fn gated(self) -> Self {
        self.open.send_replace(false);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn open_gate(&self) {
        self.open.send_replace(true);
    }

    pub fn close_gate(&self) {
        self.open.send_replace(false);
    }

    /// Number of calls started so far, including ones held at the gate
    pub fn call_count(&self) -> usize {
        *self.started.borrow()
    }

    /// Number of calls started for `request`
    pub fn calls_for(&self, request: &PermissionRequest) -> usize {
        self.calls.lock().unwrap().iter().filter(|r| *r == request).count()
    }

    /// Wait until at least `n` calls have started
    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.started.subscribe();
        rx.wait_for(|started| *started >= n).await.unwrap();
    }
}

impl Default for MockChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccessChecker for MockChecker {
    async fn check_access(&self, request: &PermissionRequest) -> Result<Decision> {
        self.calls.lock().unwrap().push(request.clone());
        self.started.send_modify(|started| *started += 1);

        let mut open = self.open.subscribe();
        open.wait_for(|open| *open).await.unwrap();

        self.outcomes.get(&request.key()).unwrap_or(&self.fallback).resolve()
    }
}
