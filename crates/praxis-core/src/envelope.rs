//! HAL-style response envelope builders.
//!
//! Every codec renders the same envelope shapes built here: single
//! resources (`attributes..., _embedded?, _errors?, _links`), collections
//! (`total/limit/currentPage/params/_embedded/_links` with pagination
//! links), and errors (`error: {code, type, message}`). Tabular codecs
//! flatten these shapes lossily; that asymmetry lives in the codec crate,
//! not here.

use indexmap::IndexMap;
use serde_json::Map;

use crate::{Collection, Link, Payload, Resource, RestError, Value};

/// Sentinel page number substituted into the templated `page` link.
const PAGE_TEMPLATE_SENTINEL: u32 = 987_654_321;

/// Builds the envelope value for any payload.
///
/// [`Payload::Empty`] maps to `Value::Null`; callers emit no body for it.
#[must_use]
pub fn payload_value(payload: &Payload) -> Value {
    match payload {
        Payload::Resource(resource) => resource_value(resource.as_ref()),
        Payload::Collection(collection) => collection_value(collection),
        Payload::Data(value) => value.clone(),
        Payload::Empty => Value::Null,
    }
}

/// Builds the envelope for a single resource.
///
/// The `self` link is guaranteed: when the resource declares none, one is
/// synthesized from the type name and primary key.
#[must_use]
pub fn resource_value(resource: &dyn Resource) -> Value {
    let mut out = Map::new();
    let attributes = resource.attributes();
    for name in resource.visible_attribute_names() {
        let value = attributes.get(&name).cloned().unwrap_or(Value::Null);
        out.insert(name, value);
    }

    let embedded = resource.embedded();
    if !embedded.is_empty() {
        let map: Map<String, Value> = embedded.into_iter().collect();
        out.insert("_embedded".to_string(), Value::Object(map));
    }

    if resource.is_deleted() {
        out.insert("_deleted".to_string(), Value::Bool(true));
    }

    let errors = resource.errors();
    if !errors.is_empty() {
        out.insert("_errors".to_string(), errors.to_value());
    }

    let mut links = resource.links();
    if !links.contains_key("self") {
        links.insert("self".to_string(), Link::new(self_href(resource)));
        if let Some(index) = links.get_index_of("self") {
            links.move_index(index, 0);
        }
    }
    out.insert("_links".to_string(), links_value(&links));

    Value::Object(out)
}

/// Builds the envelope for a paginated collection.
#[must_use]
pub fn collection_value(collection: &Collection) -> Value {
    let items: Vec<Value> = collection
        .items
        .iter()
        .map(|item| resource_value(item.as_ref()))
        .collect();

    let mut embedded = Map::new();
    embedded.insert(collection.container_name.clone(), Value::Array(items));

    let params: Map<String, Value> = collection
        .params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let mut out = Map::new();
    out.insert("total".to_string(), Value::from(collection.total));
    out.insert(
        "limit".to_string(),
        collection.limit.map_or(Value::Null, Value::from),
    );
    out.insert(
        "currentPage".to_string(),
        Value::from(collection.current_page),
    );
    out.insert("params".to_string(), Value::Object(params));
    out.insert("_embedded".to_string(), Value::Object(embedded));
    out.insert(
        "_links".to_string(),
        links_value(&pagination_links(collection)),
    );
    Value::Object(out)
}

/// Builds the uniform error envelope.
#[must_use]
pub fn error_value(error: &RestError) -> Value {
    let mut detail = Map::new();
    detail.insert(
        "code".to_string(),
        Value::from(error.status_code().as_u16()),
    );
    detail.insert(
        "type".to_string(),
        Value::String(error.type_name().to_string()),
    );
    detail.insert("message".to_string(), Value::String(error.to_string()));

    let mut out = Map::new();
    out.insert("error".to_string(), Value::Object(detail));
    Value::Object(out)
}

/// Builds the pagination link set for a collection.
///
/// `prevPage` is present only when `currentPage > 0`; `nextPage` only when
/// more pages remain. A single-page collection has neither.
#[must_use]
pub fn pagination_links(collection: &Collection) -> IndexMap<String, Link> {
    let pages = collection.page_count();
    let current = collection.current_page;

    let mut links = IndexMap::new();
    links.insert(
        "self".to_string(),
        Link::titled(collection.label.clone(), page_url(collection, 0)),
    );
    links.insert(
        "page".to_string(),
        Link::templated(
            "Page",
            page_url(collection, PAGE_TEMPLATE_SENTINEL)
                .replace(&PAGE_TEMPLATE_SENTINEL.to_string(), "{page}"),
        ),
    );
    links.insert(
        "firstPage".to_string(),
        Link::titled("First Page", page_url(collection, 0)),
    );
    if current > 0 {
        links.insert(
            "prevPage".to_string(),
            Link::titled("Previous Page", page_url(collection, current - 1)),
        );
    }
    if current + 1 < pages {
        links.insert(
            "nextPage".to_string(),
            Link::titled("Next Page", page_url(collection, current + 1)),
        );
    }
    links.insert(
        "lastPage".to_string(),
        Link::titled("Last Page", page_url(collection, pages.saturating_sub(1))),
    );
    links
}

fn page_url(collection: &Collection, page: u32) -> String {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (name, value) in &collection.params {
        if name == "page" {
            continue;
        }
        pairs.push((name.clone(), scalar_string(value)));
    }
    pairs.push(("page".to_string(), page.to_string()));

    match serde_urlencoded::to_string(&pairs) {
        Ok(query) => format!("{}?{query}", collection.base_path),
        Err(_) => collection.base_path.clone(),
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn links_value(links: &IndexMap<String, Link>) -> Value {
    let map: Map<String, Value> = links
        .iter()
        .map(|(name, link)| {
            (
                name.clone(),
                serde_json::to_value(link).unwrap_or(Value::Null),
            )
        })
        .collect();
    Value::Object(map)
}

fn self_href(resource: &dyn Resource) -> String {
    let segment = dash_case(resource.type_name());
    match resource.primary_key() {
        Some(pk) => format!("/{segment}/{}", pk_string(&pk)),
        None => format!("/{segment}"),
    }
}

/// Renders a primary key value as a path segment. Composite keys join
/// their values with commas.
#[must_use]
pub fn pk_string(pk: &Value) -> String {
    match pk {
        Value::Object(map) => map
            .values()
            .map(scalar_string)
            .collect::<Vec<_>>()
            .join(","),
        other => scalar_string(other),
    }
}

fn dash_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{widget, widget_descriptor};
    use crate::AttributeMap;
    use serde_json::json;

    fn collection(total: u64, limit: u32, page: u32) -> Collection {
        Collection {
            resource_type: "widgets".to_string(),
            container_name: "widgets".to_string(),
            label: "Widgets".to_string(),
            items: vec![],
            total,
            limit: Some(limit),
            current_page: page,
            params: AttributeMap::new(),
            base_path: "/widgets".to_string(),
        }
    }

    #[test]
    fn test_resource_envelope_has_self_link() {
        let resource = widget(42, "sprocket", "red");
        let value = resource_value(&resource);

        assert_eq!(value["id"], json!(42));
        assert_eq!(value["name"], json!("sprocket"));
        assert_eq!(value["_links"]["self"]["href"], json!("/widgets/42"));
    }

    #[test]
    fn test_resource_envelope_includes_errors() {
        let mut resource = widget(42, "sprocket", "red");
        resource.errors.add("name", "Name is taken.");

        let value = resource_value(&resource);
        assert_eq!(value["_errors"]["name"][0], json!("Name is taken."));
    }

    #[test]
    fn test_deleted_marker() {
        let mut resource = widget(42, "sprocket", "red");
        resource.deleted = true;
        assert_eq!(resource_value(&resource)["_deleted"], json!(true));
    }

    #[test]
    fn test_first_page_has_no_prev() {
        let links = pagination_links(&collection(30, 10, 0));
        assert!(!links.contains_key("prevPage"));
        assert!(links.contains_key("nextPage"));
    }

    #[test]
    fn test_last_page_has_no_next() {
        let links = pagination_links(&collection(30, 10, 2));
        assert!(links.contains_key("prevPage"));
        assert!(!links.contains_key("nextPage"));
    }

    #[test]
    fn test_single_page_has_neither() {
        let links = pagination_links(&collection(5, 10, 0));
        assert!(!links.contains_key("prevPage"));
        assert!(!links.contains_key("nextPage"));
        assert_eq!(links["lastPage"].href, "/widgets?page=0");
    }

    #[test]
    fn test_page_link_is_templated() {
        let links = pagination_links(&collection(30, 10, 1));
        assert!(links["page"].templated);
        assert!(links["page"].href.contains("page={page}"));
    }

    #[test]
    fn test_collection_envelope_shape() {
        let mut collection = collection(1, 10, 0);
        collection.items.push(Box::new(widget(1, "gear", "blue")));

        let value = collection_value(&collection);
        assert_eq!(value["total"], json!(1));
        assert_eq!(value["currentPage"], json!(0));
        assert_eq!(value["_embedded"]["widgets"][0]["name"], json!("gear"));
    }

    #[test]
    fn test_error_envelope_shape() {
        let value = error_value(&RestError::not_found("no such widget"));
        assert_eq!(value["error"]["code"], json!(404));
        assert_eq!(value["error"]["type"], json!("NotFoundError"));
        assert_eq!(value["error"]["message"], json!("no such widget"));
    }

    #[test]
    fn test_descriptor_fixture_consistency() {
        // The fixture widget must expose the attributes its descriptor declares.
        let descriptor = widget_descriptor();
        let resource = widget(1, "gear", "blue");
        for name in descriptor.visible_attribute_names() {
            assert!(resource.attributes().contains_key(&name), "missing {name}");
        }
    }
}
