//! Search/filter/pagination/embed criteria.
//!
//! [`Criteria`] is the composable descriptor every action resolves before
//! talking to the resource store. It is immutable by convention: merging
//! produces a new value and nothing mutates a criteria after the merge
//! completes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{AttributeMap, RestError, RestResult, Value};

/// A named model scope, optionally parameterized.
///
/// Scopes are passed opaquely to the [`crate::ResourceStore`]; the core
/// never interprets their semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scope {
    /// A bare scope name.
    Named(String),
    /// A scope name with parameters.
    WithParams(String, Vec<Value>),
}

/// A composable search/filter descriptor.
///
/// # Merge semantics
///
/// Merging two criteria concatenates filters (right overrides on key
/// collision), unions embed sets, concatenates query text with a space
/// separator, and lets the right-hand `limit`/`page` win.
///
/// # Example
///
/// ```
/// use praxis_core::Criteria;
///
/// let left = Criteria::new().with_query("red").with_limit(10);
/// let right = Criteria::new().with_query("widget").with_limit(25);
///
/// let merged = left.merge(&right);
/// assert_eq!(merged.query.as_deref(), Some("red widget"));
/// assert_eq!(merged.limit, Some(25));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    /// Free-text query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Attribute filter map.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub filter: AttributeMap,

    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Zero-based page index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Ordered set of relation names to eagerly embed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embed: Vec<String>,

    /// Ordered set of scopes to apply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<Scope>,
}

impl Criteria {
    /// Creates an empty criteria.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the free-text query.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Adds a filter entry.
    #[must_use]
    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(name.into(), value.into());
        self
    }

    /// Sets the page size.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the zero-based page index.
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Adds an embed name if not already present.
    #[must_use]
    pub fn with_embed(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.embed.contains(&name) {
            self.embed.push(name);
        }
        self
    }

    /// Adds a scope.
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scopes.push(scope);
        self
    }

    /// Merges this criteria with another, returning a new criteria.
    ///
    /// `other` is the right-hand side and wins on collisions. Neither
    /// operand is modified.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let query = match (&self.query, &other.query) {
            (Some(left), Some(right)) => Some(format!("{left} {right}")),
            (Some(left), None) => Some(left.clone()),
            (None, Some(right)) => Some(right.clone()),
            (None, None) => None,
        };

        let mut filter = self.filter.clone();
        for (name, value) in &other.filter {
            filter.insert(name.clone(), value.clone());
        }

        let mut embed = self.embed.clone();
        for name in &other.embed {
            if !embed.contains(name) {
                embed.push(name.clone());
            }
        }

        let mut scopes = self.scopes.clone();
        scopes.extend(other.scopes.iter().cloned());

        Self {
            query,
            filter,
            limit: other.limit.or(self.limit),
            page: other.page.or(self.page),
            embed,
            scopes,
        }
    }

    /// Constructs a criteria from wire-format request parameters.
    ///
    /// Recognized keys: `q` (string), `filter` (map), `limit`/`page`
    /// (non-negative integers), `_embed` (comma-separated string).
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Validation`] for a non-map `filter` or a
    /// non-numeric `limit`/`page`.
    pub fn from_params(params: &AttributeMap) -> RestResult<Self> {
        let mut criteria = Self::new();

        if let Some(q) = params.get("q") {
            let text = match q {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if !text.is_empty() {
                criteria.query = Some(text);
            }
        }

        if let Some(filter) = params.get("filter") {
            match filter {
                Value::Object(map) => {
                    for (name, value) in map {
                        criteria.filter.insert(name.clone(), value.clone());
                    }
                }
                _ => {
                    return Err(RestError::validation(
                        "Invalid request, filter must be a map.",
                    ))
                }
            }
        }

        criteria.limit = parse_page_param(params, "limit")?;
        criteria.page = parse_page_param(params, "page")?;

        if let Some(Value::String(embed)) = params.get("_embed") {
            for name in embed.split(',') {
                let name = name.trim();
                if !name.is_empty() && !criteria.embed.iter().any(|e| e == name) {
                    criteria.embed.push(name.to_string());
                }
            }
        }

        Ok(criteria)
    }

    /// Serializes the criteria back into wire-format parameters.
    #[must_use]
    pub fn to_query_params(&self) -> AttributeMap {
        let mut params = AttributeMap::new();
        if let Some(query) = &self.query {
            params.insert("q".to_string(), Value::String(query.clone()));
        }
        if !self.filter.is_empty() {
            let map: serde_json::Map<String, Value> = self
                .filter
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            params.insert("filter".to_string(), Value::Object(map));
        }
        if let Some(limit) = self.limit {
            params.insert("limit".to_string(), Value::from(limit));
        }
        if let Some(page) = self.page {
            params.insert("page".to_string(), Value::from(page));
        }
        if !self.embed.is_empty() {
            params.insert("_embed".to_string(), Value::String(self.embed.join(",")));
        }
        params
    }
}

fn parse_page_param(params: &AttributeMap, name: &str) -> RestResult<Option<u32>> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| {
                RestError::validation(format!("Invalid request, {name} must be a whole number."))
            }),
        Some(Value::String(s)) => s.parse::<u32>().map(Some).map_err(|_| {
            RestError::validation(format!("Invalid request, {name} must be a whole number."))
        }),
        Some(_) => Err(RestError::validation(format!(
            "Invalid request, {name} must be a whole number."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> AttributeMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_merge_right_overrides_filter() {
        let left = Criteria::new()
            .with_filter("color", "red")
            .with_filter("size", 3);
        let right = Criteria::new().with_filter("color", "blue");

        let merged = left.merge(&right);
        assert_eq!(merged.filter["color"], json!("blue"));
        assert_eq!(merged.filter["size"], json!(3));
    }

    #[test]
    fn test_merge_unions_embed() {
        let left = Criteria::new().with_embed("parts").with_embed("owner");
        let right = Criteria::new().with_embed("owner").with_embed("tags");

        let merged = left.merge(&right);
        assert_eq!(merged.embed, vec!["parts", "owner", "tags"]);
    }

    #[test]
    fn test_merge_query_concatenates() {
        let left = Criteria::new().with_query("red");
        let right = Criteria::new().with_query("widget");
        assert_eq!(left.merge(&right).query.as_deref(), Some("red widget"));
    }

    #[test]
    fn test_merge_right_paging_wins() {
        let left = Criteria::new().with_limit(10).with_page(1);
        let right = Criteria::new().with_limit(25);

        let merged = left.merge(&right);
        assert_eq!(merged.limit, Some(25));
        assert_eq!(merged.page, Some(1));
    }

    #[test]
    fn test_merge_does_not_mutate_operands() {
        let left = Criteria::new().with_filter("a", 1);
        let right = Criteria::new().with_filter("b", 2);
        let _ = left.merge(&right);
        assert_eq!(left.filter.len(), 1);
        assert_eq!(right.filter.len(), 1);
    }

    #[test]
    fn test_from_params() {
        let criteria = Criteria::from_params(&params(&[
            ("q", json!("foo")),
            ("filter", json!({"color": "red"})),
            ("page", json!("2")),
            ("limit", json!(10)),
            ("_embed", json!("parts, owner")),
        ]))
        .unwrap();

        assert_eq!(criteria.query.as_deref(), Some("foo"));
        assert_eq!(criteria.filter["color"], json!("red"));
        assert_eq!(criteria.page, Some(2));
        assert_eq!(criteria.limit, Some(10));
        assert_eq!(criteria.embed, vec!["parts", "owner"]);
    }

    #[test]
    fn test_from_params_rejects_non_map_filter() {
        let err = Criteria::from_params(&params(&[("filter", json!("color=red"))])).unwrap_err();
        assert!(matches!(err, RestError::Validation { .. }));
    }

    #[test]
    fn test_from_params_rejects_non_numeric_paging() {
        let err = Criteria::from_params(&params(&[("limit", json!("ten"))])).unwrap_err();
        assert!(matches!(err, RestError::Validation { .. }));

        let err = Criteria::from_params(&params(&[("page", json!(-1))])).unwrap_err();
        assert!(matches!(err, RestError::Validation { .. }));
    }

    #[test]
    fn test_query_params_round_trip() {
        let criteria = Criteria::new()
            .with_query("foo")
            .with_filter("color", "red")
            .with_limit(10)
            .with_page(2)
            .with_embed("parts");

        let reparsed = Criteria::from_params(&criteria.to_query_params()).unwrap();
        assert_eq!(reparsed, criteria);
    }

    fn arb_filter_key() -> impl Strategy<Value = String> {
        "[a-d]{1,3}"
    }

    fn arb_criteria() -> impl Strategy<Value = Criteria> {
        (
            proptest::option::of("[a-z]{1,6}"),
            proptest::collection::vec((arb_filter_key(), 0i64..100), 0..4),
            proptest::collection::vec("[a-f]{1,4}", 0..3),
        )
            .prop_map(|(query, filter, embed)| {
                let mut criteria = Criteria::new();
                criteria.query = query;
                for (k, v) in filter {
                    criteria.filter.insert(k, Value::from(v));
                }
                for name in embed {
                    if !criteria.embed.contains(&name) {
                        criteria.embed.push(name);
                    }
                }
                criteria
            })
    }

    proptest! {
        /// Merge is associative for filter maps and embed sets when no
        /// filter keys collide. (With collisions the right-hand override
        /// makes grouping observable, which is documented behavior.)
        #[test]
        fn prop_merge_associative_without_collisions(
            a in arb_criteria(),
            b in arb_criteria(),
            c in arb_criteria(),
        ) {
            let mut keys: Vec<&String> = a.filter.keys().collect();
            keys.extend(b.filter.keys());
            keys.extend(c.filter.keys());
            let unique = {
                let mut sorted = keys.clone();
                sorted.sort();
                sorted.dedup();
                sorted.len() == keys.len()
            };
            prop_assume!(unique);

            let left = a.merge(&b).merge(&c);
            let right = a.merge(&b.merge(&c));
            prop_assert_eq!(&left.filter, &right.filter);
            prop_assert_eq!(&left.embed, &right.embed);
        }
    }
}
