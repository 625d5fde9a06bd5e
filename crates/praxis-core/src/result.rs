//! The action result contract.

use http::StatusCode;

use crate::{AttributeMap, Resource, Value};

/// The data carried by an [`ActionResult`].
pub enum Payload {
    /// A single resource.
    Resource(Box<dyn Resource>),
    /// A paginated collection.
    Collection(Collection),
    /// Raw data (aggregate/stat/option/trace output).
    Data(Value),
    /// No body (e.g. 204).
    Empty,
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resource(resource) => f
                .debug_tuple("Resource")
                .field(&resource.type_name())
                .finish(),
            Self::Collection(collection) => f
                .debug_tuple("Collection")
                .field(&collection.container_name)
                .finish(),
            Self::Data(value) => f.debug_tuple("Data").field(value).finish(),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

/// A page of resources plus everything the envelope builder needs to
/// produce pagination links.
pub struct Collection {
    /// The resource type name.
    pub resource_type: String,
    /// The `_embedded` container key (plural resource name).
    pub container_name: String,
    /// Human-readable plural label.
    pub label: String,
    /// The resources on this page.
    pub items: Vec<Box<dyn Resource>>,
    /// Total matching resources across all pages.
    pub total: u64,
    /// Page size, if paging applies.
    pub limit: Option<u32>,
    /// Zero-based current page index.
    pub current_page: u32,
    /// The search parameters that produced this page.
    pub params: AttributeMap,
    /// The collection base path, used for pagination links.
    pub base_path: String,
}

impl Collection {
    /// Returns the total number of pages (at least 1).
    #[must_use]
    pub fn page_count(&self) -> u32 {
        match self.limit {
            Some(limit) if limit > 0 => {
                let pages = self.total.div_ceil(u64::from(limit));
                u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
            }
            _ => 1,
        }
    }
}

/// The tuple every resource action returns: status, payload, extra
/// headers, and whether the host should terminate after responding.
#[derive(Debug)]
pub struct ActionResult {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response payload.
    pub payload: Payload,
    /// Extra response headers.
    pub headers: Vec<(String, String)>,
    /// Whether the host application should terminate after responding.
    pub terminate: bool,
}

impl ActionResult {
    /// Creates a result with the given status and payload.
    #[must_use]
    pub fn new(status: StatusCode, payload: Payload) -> Self {
        Self {
            status,
            payload,
            headers: Vec::new(),
            terminate: true,
        }
    }

    /// Creates a `200 OK` result.
    #[must_use]
    pub fn ok(payload: Payload) -> Self {
        Self::new(StatusCode::OK, payload)
    }

    /// Adds a response header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(total: u64, limit: Option<u32>) -> Collection {
        Collection {
            resource_type: "widgets".to_string(),
            container_name: "widgets".to_string(),
            label: "Widgets".to_string(),
            items: Vec::new(),
            total,
            limit,
            current_page: 0,
            params: AttributeMap::new(),
            base_path: "/widgets".to_string(),
        }
    }

    #[test]
    fn test_page_count() {
        assert_eq!(collection(0, Some(10)).page_count(), 1);
        assert_eq!(collection(10, Some(10)).page_count(), 1);
        assert_eq!(collection(11, Some(10)).page_count(), 2);
        assert_eq!(collection(100, None).page_count(), 1);
    }
}
