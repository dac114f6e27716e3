//! Request builders for common test shapes

use access_review_types::PermissionRequest;

/// A cluster-scoped request in the core group (e.g. `list nodes`)
pub fn cluster_request(resource: &str, verb: &str) -> PermissionRequest {
    PermissionRequest::builder().resource(resource).verb(verb).build()
}

/// A namespaced request in the core group
pub fn namespaced_request(resource: &str, namespace: &str, verb: &str) -> PermissionRequest {
    PermissionRequest::builder().resource(resource).namespace(namespace).verb(verb).build()
}

/// A request for one named object
pub fn named_request(
    group: &str,
    resource: &str,
    namespace: &str,
    name: &str,
    verb: &str,
) -> PermissionRequest {
    PermissionRequest::builder()
        .group(group)
        .resource(resource)
        .namespace(namespace)
        .name(name)
        .verb(verb)
        .build()
}
