//! Boundary to the external authorization decision service

use std::sync::Arc;

use access_review_types::{Decision, PermissionRequest};
use async_trait::async_trait;

use crate::error::Result;

/// Answers one permission question
///
/// Implementations issue exactly one call to the decision service per
/// invocation and never retry; retry policy belongs to the caller.
#[async_trait]
pub trait AccessChecker: Send + Sync {
    /// Ask whether the current user may perform the request
    async fn check_access(&self, request: &PermissionRequest) -> Result<Decision>;
}

#[async_trait]
impl<T: AccessChecker + ?Sized> AccessChecker for Arc<T> {
    async fn check_access(&self, request: &PermissionRequest) -> Result<Decision> {
        (**self).check_access(request).await
    }
}
