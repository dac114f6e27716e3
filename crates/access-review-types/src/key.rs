//! Canonical request keys
//!
//! A [`RequestKey`] is the identity used for cache and in-flight lookups. It is
//! a JSON object rendered with sorted field names and absent optional fields
//! omitted, so equal requests always produce equal keys and JSON escaping keeps
//! distinct requests from colliding.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::PermissionRequest;

/// Canonical, cheaply cloneable identifier for a [`PermissionRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestKey(Arc<str>);

impl RequestKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&PermissionRequest> for RequestKey {
    fn from(request: &PermissionRequest) -> Self {
        fn put(fields: &mut Map<String, Value>, field: &str, value: Option<&String>) {
            if let Some(value) = value {
                fields.insert(field.into(), Value::from(value.as_str()));
            }
        }

        // Sorted insertion order, identical with or without `preserve_order`
        let mut fields = Map::new();
        put(&mut fields, "group", Some(&request.group));
        put(&mut fields, "name", request.name.as_ref());
        put(&mut fields, "namespace", request.namespace.as_ref());
        put(&mut fields, "resource", Some(&request.resource));
        put(&mut fields, "subresource", request.subresource.as_ref());
        put(&mut fields, "verb", Some(&request.verb));

        Self(Value::Object(fields).to_string().into())
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn request(namespace: Option<&str>, name: Option<&str>) -> PermissionRequest {
        PermissionRequest {
            group: "apps".into(),
            resource: "deployments".into(),
            namespace: namespace.map(Into::into),
            name: name.map(Into::into),
            subresource: None,
            verb: "patch".into(),
        }
    }

    #[test]
    fn test_key_is_stable() {
        let req = request(Some("default"), Some("web"));

        assert_eq!(RequestKey::from(&req), RequestKey::from(&req.clone()));
        assert_eq!(
            RequestKey::from(&req).as_str(),
            r#"{"group":"apps","name":"web","namespace":"default","resource":"deployments","verb":"patch"}"#
        );
    }

    #[test]
    fn test_absent_and_empty_fields_differ() {
        let absent = RequestKey::from(&request(None, None));
        let empty = RequestKey::from(&request(Some(""), None));

        assert_ne!(absent, empty);
    }

    #[test]
    fn test_field_values_cannot_bleed_into_neighbours() {
        // Same concatenated text, different field boundaries
        let a = request(Some("a\",\"name\":\"b"), None);
        let b = request(Some("a"), Some("b"));

        assert_ne!(RequestKey::from(&a), RequestKey::from(&b));
    }

    fn arb_request() -> impl Strategy<Value = PermissionRequest> {
        (
            "[a-z.]{0,8}",
            "[a-z]{1,8}",
            proptest::option::of("[-a-z0-9\"]{0,6}"),
            proptest::option::of("[-a-z0-9:]{0,6}"),
            proptest::option::of("[a-z/]{0,6}"),
            "[a-z]{1,6}",
        )
            .prop_map(|(group, resource, namespace, name, subresource, verb)| PermissionRequest {
                group,
                resource,
                namespace,
                name,
                subresource,
                verb,
            })
    }

    proptest! {
        #[test]
        fn prop_keys_agree_with_request_equality(a in arb_request(), b in arb_request()) {
            prop_assert_eq!(a == b, RequestKey::from(&a) == RequestKey::from(&b));
        }

        #[test]
        fn prop_key_independent_of_identity(a in arb_request()) {
            let copy = a.clone();
            prop_assert_eq!(RequestKey::from(&a), RequestKey::from(&copy));
        }
    }
}
