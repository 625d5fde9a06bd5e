//! The action-facing view of an HTTP request, plus the resolved target.
//!
//! The router reduces a transport request to an [`ActionRequest`] (verb,
//! merged parameters, decoded input) and a [`Target`] (which resource or
//! collection, optionally through a relation). Actions never see the raw
//! request.

use http::{HeaderMap, Method};
use praxis_core::{AttributeMap, Value};

/// A decoded, transport-independent request.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    /// The HTTP method.
    pub method: Method,
    /// The matched route, for diagnostics and the trace echo.
    pub route: String,
    /// The request headers.
    pub headers: HeaderMap,
    /// Query and path parameters, merged.
    pub params: AttributeMap,
    /// The decoded request body, if a codec produced one.
    pub input: Option<Value>,
    /// The client address, if the host knows it.
    pub remote_addr: Option<String>,
}

impl ActionRequest {
    /// Creates a request with no parameters, headers, or input.
    #[must_use]
    pub fn new(method: Method, route: impl Into<String>) -> Self {
        Self {
            method,
            route: route.into(),
            headers: HeaderMap::new(),
            params: AttributeMap::new(),
            input: None,
            remote_addr: None,
        }
    }

    /// Adds a request parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Sets the decoded input body.
    #[must_use]
    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    /// Adds a request header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::try_from(name),
            http::header::HeaderValue::try_from(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the client address.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns the input body as an attribute map when it is an object.
    ///
    /// Scalar or array bodies yield `None`: actions apply attribute maps,
    /// anything else is not assignable input.
    #[must_use]
    pub fn input_map(&self) -> Option<AttributeMap> {
        match &self.input {
            Some(Value::Object(map)) => Some(
                map.iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// The resource or collection a request resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// The resource type name.
    pub resource_type: String,
    /// The primary key, for item targets.
    pub primary_key: Option<Value>,
    /// The relation name, for relation targets.
    pub relation: Option<String>,
    /// The related resource's primary key, for related item targets.
    pub relation_primary_key: Option<Value>,
}

impl Target {
    /// Creates a collection target.
    #[must_use]
    pub fn collection(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            primary_key: None,
            relation: None,
            relation_primary_key: None,
        }
    }

    /// Creates an item target.
    #[must_use]
    pub fn item(resource_type: impl Into<String>, primary_key: impl Into<Value>) -> Self {
        Self {
            resource_type: resource_type.into(),
            primary_key: Some(primary_key.into()),
            relation: None,
            relation_primary_key: None,
        }
    }

    /// Scopes the target to a named relation of the item.
    #[must_use]
    pub fn with_relation(mut self, name: impl Into<String>) -> Self {
        self.relation = Some(name.into());
        self
    }

    /// Sets the related resource's primary key.
    #[must_use]
    pub fn with_relation_primary_key(mut self, pk: impl Into<Value>) -> Self {
        self.relation_primary_key = Some(pk.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_map_requires_object() {
        let request = ActionRequest::new(Method::POST, "widgets/create")
            .with_input(json!({"name": "gear"}));
        assert_eq!(request.input_map().unwrap()["name"], json!("gear"));

        let request = ActionRequest::new(Method::POST, "widgets/create").with_input(json!([1, 2]));
        assert!(request.input_map().is_none());

        let request = ActionRequest::new(Method::POST, "widgets/create");
        assert!(request.input_map().is_none());
    }

    #[test]
    fn test_header_lookup() {
        let request =
            ActionRequest::new(Method::GET, "widgets/read").with_header("Destination", "/widgets/9");
        assert_eq!(request.header("Destination"), Some("/widgets/9"));
        assert_eq!(request.header("destination"), Some("/widgets/9"));
        assert!(request.header("Accept").is_none());
    }

    #[test]
    fn test_target_builders() {
        let target = Target::item("widgets", 1)
            .with_relation("parts")
            .with_relation_primary_key(7);
        assert_eq!(target.primary_key, Some(json!(1)));
        assert_eq!(target.relation.as_deref(), Some("parts"));
        assert_eq!(target.relation_primary_key, Some(json!(7)));
    }
}
