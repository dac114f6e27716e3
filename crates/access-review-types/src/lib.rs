//! # Access Review Types
//!
//! Shared type definitions for access review coordination.
//!
//! Every crate in the workspace talks in terms of these types: the request a
//! caller asks about, the canonical key used to deduplicate and cache it, and
//! the decision the authorization service hands back.

#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};

// ============================================================================
// Request Keys
// ============================================================================

pub mod key;

pub use key::RequestKey;

// ============================================================================
// Core Domain Types
// ============================================================================

/// A single authorization question: may the current user perform `verb` on
/// the described resource?
///
/// Two requests are equivalent iff every field compares equal. An absent
/// optional field is distinct from an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, bon::Builder)]
pub struct PermissionRequest {
    /// API group of the resource (empty string for the core group)
    #[builder(into, default)]
    pub group: String,
    /// Resource kind, plural form (e.g. "deployments")
    #[builder(into)]
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub subresource: Option<String>,
    /// Action being attempted (e.g. "get", "delete", "patch")
    #[builder(into)]
    pub verb: String,
}

impl PermissionRequest {
    /// Canonical key for this request
    pub fn key(&self) -> RequestKey {
        RequestKey::from(self)
    }
}

/// The result of a permission check
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed { Decision::Allow } else { Decision::Deny }
    }
}

/// A resolved permission check, as held by the permission cache
///
/// Entries are created on the first successful resolution of a key and never
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub request: PermissionRequest,
    pub decision: Decision,
}

impl CacheEntry {
    pub fn new(request: PermissionRequest, decision: Decision) -> Self {
        Self { request, decision }
    }

    pub fn allowed(&self) -> bool {
        self.decision.is_allowed()
    }
}

/// One element of a batch's results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionResult {
    pub request: PermissionRequest,
    pub allowed: bool,
}

impl PermissionResult {
    pub fn new(request: PermissionRequest, allowed: bool) -> Self {
        Self { request, allowed }
    }
}

impl From<CacheEntry> for PermissionResult {
    fn from(entry: CacheEntry) -> Self {
        let allowed = entry.allowed();
        Self { request: entry.request, allowed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let request = PermissionRequest::builder().resource("pods").verb("list").build();

        assert_eq!(request.group, "");
        assert_eq!(request.resource, "pods");
        assert_eq!(request.verb, "list");
        assert!(request.namespace.is_none());
        assert!(request.name.is_none());
        assert!(request.subresource.is_none());
    }

    #[test]
    fn test_request_equality_is_field_wise() {
        let a = PermissionRequest::builder()
            .group("apps")
            .resource("deployments")
            .namespace("default")
            .verb("delete")
            .build();
        let b = a.clone();
        let c = PermissionRequest { namespace: Some(String::new()), ..a.clone() };

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_decision_from_bool() {
        assert_eq!(Decision::from(true), Decision::Allow);
        assert_eq!(Decision::from(false), Decision::Deny);
        assert!(Decision::Allow.is_allowed());
        assert!(!Decision::Deny.is_allowed());
    }

    #[test]
    fn test_result_from_cache_entry() {
        let request = PermissionRequest::builder().resource("secrets").verb("get").build();
        let entry = CacheEntry::new(request.clone(), Decision::Deny);

        let result = PermissionResult::from(entry);

        assert_eq!(result, PermissionResult::new(request, false));
    }

    #[test]
    fn test_request_serialization_omits_absent_fields() {
        let request = PermissionRequest::builder().resource("pods").verb("get").build();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json, serde_json::json!({ "group": "", "resource": "pods", "verb": "get" }));
    }
}
