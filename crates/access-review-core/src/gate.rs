//! Long-lived permission view for a UI surface
//!
//! A [`PermissionGate`] holds the request list a surface currently cares
//! about and re-evaluates only when that list changes by value. Handing it an
//! equal list (even a freshly built one) is a no-op.

use std::sync::Arc;

use access_review_types::PermissionRequest;
use tokio::{sync::watch, task::JoinHandle};

use crate::batch::{BatchCoordinator, BatchHandle, BatchState, Subscription};

pub struct PermissionGate {
    coordinator: BatchCoordinator,
    requests: Vec<PermissionRequest>,
    view: Arc<watch::Sender<BatchState>>,
    forwarder: JoinHandle<()>,
}

impl PermissionGate {
    /// Create a gate and start evaluating `requests`
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(coordinator: BatchCoordinator, requests: Vec<PermissionRequest>) -> Self {
        let batch = coordinator.evaluate(requests.clone());
        let view = Arc::new(watch::Sender::new(batch.state()));
        let forwarder = forward(batch, Arc::clone(&view));

        Self { coordinator, requests, view, forwarder }
    }

    /// Replace the request list
    ///
    /// Starts a new batch and returns `true` only when `requests` differs from
    /// the current list. The previous batch is abandoned; its checks still
    /// complete into the cache.
    pub fn set_requests(&mut self, requests: Vec<PermissionRequest>) -> bool {
        if requests == self.requests {
            return false;
        }

        tracing::debug!(requests = requests.len(), "Permission gate request list changed");
        self.forwarder.abort();

        let batch = self.coordinator.evaluate(requests.clone());
        self.view.send_replace(batch.state());
        self.forwarder = forward(batch, Arc::clone(&self.view));
        self.requests = requests;
        true
    }

    pub fn requests(&self) -> &[PermissionRequest] {
        &self.requests
    }

    /// Current aggregate for the current request list
    pub fn state(&self) -> BatchState {
        self.view.borrow().clone()
    }

    /// A receiver that observes every state the gate publishes
    pub fn watch(&self) -> watch::Receiver<BatchState> {
        self.view.subscribe()
    }

    /// Call `callback` with the current state and on every change, across
    /// request-list changes
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&BatchState) + Send + 'static,
    {
        Subscription::spawn(self.view.subscribe(), BatchState::clone, callback)
    }
}

impl Drop for PermissionGate {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

/// Mirror `batch` into `view` until the batch finishes
fn forward(mut batch: BatchHandle, view: Arc<watch::Sender<BatchState>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(state) = batch.next_state().await {
            view.send_if_modified(|current| {
                if *current == state {
                    return false;
                }
                *current = state;
                true
            });
        }
    })
}
