//! Test fixtures for Praxis development and testing.
//!
//! This module provides an in-memory resource store, schema registry, and
//! event streams that satisfy the collaborator traits, so the action and
//! dispatch layers can be tested across the workspace without a database.
//!
//! # Example
//!
//! ```
//! use praxis_core::fixtures;
//! use praxis_core::{Criteria, ResourceStore};
//!
//! let store = fixtures::store_with_widgets(3);
//! let page = store.search("widgets", &Criteria::new()).unwrap();
//! assert_eq!(page.total, 3);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde_json::json;

use crate::{
    AttributeDescriptor, AttributeMap, ChangeEvent, Criteria, EventStream, FieldErrors, Link,
    LinkTemplate, PrimitiveType, RelationKind, RelationSpec, Resource, ResourceDescriptor,
    ResourceStore, RestError, RestResult, SchemaRegistry, SearchPage, Value,
};

/// The descriptor for the `widgets` fixture type.
#[must_use]
pub fn widget_descriptor() -> ResourceDescriptor {
    let mut attributes = IndexMap::new();
    attributes.insert(
        "id".to_string(),
        AttributeDescriptor::new("ID", PrimitiveType::Integer).primary_key(),
    );
    attributes.insert(
        "name".to_string(),
        AttributeDescriptor::new("Name", PrimitiveType::String).required(),
    );
    attributes.insert(
        "color".to_string(),
        AttributeDescriptor::new("Color", PrimitiveType::String),
    );
    attributes.insert(
        "locked".to_string(),
        AttributeDescriptor::new("Locked", PrimitiveType::Boolean).default_value(false),
    );

    let mut links = IndexMap::new();
    links.insert(
        "parts".to_string(),
        LinkTemplate::relation(
            "parts",
            "/widgets/{id}/parts",
            "parts",
            RelationSpec {
                kind: RelationKind::HasMany,
                foreign_key: Some("widgetId".to_string()),
            },
        ),
    );

    ResourceDescriptor {
        name: "widgets".to_string(),
        label: "Widget".to_string(),
        plural_label: "Widgets".to_string(),
        primary_key: vec!["id".to_string()],
        attributes,
        links,
    }
}

/// The descriptor for the `parts` fixture type, related to `widgets`.
#[must_use]
pub fn part_descriptor() -> ResourceDescriptor {
    let mut attributes = IndexMap::new();
    attributes.insert(
        "id".to_string(),
        AttributeDescriptor::new("ID", PrimitiveType::Integer).primary_key(),
    );
    attributes.insert(
        "widgetId".to_string(),
        AttributeDescriptor::new("Widget", PrimitiveType::Integer),
    );
    attributes.insert(
        "label".to_string(),
        AttributeDescriptor::new("Label", PrimitiveType::String).required(),
    );

    let mut links = IndexMap::new();
    links.insert(
        "widget".to_string(),
        LinkTemplate::relation(
            "widget",
            "/widgets/{widgetId}",
            "widgets",
            RelationSpec {
                kind: RelationKind::BelongsTo,
                foreign_key: Some("widgetId".to_string()),
            },
        ),
    );

    ResourceDescriptor {
        name: "parts".to_string(),
        label: "Part".to_string(),
        plural_label: "Parts".to_string(),
        primary_key: vec!["id".to_string()],
        attributes,
        links,
    }
}

/// A registry backed by a fixed descriptor map.
#[derive(Default)]
pub struct MemoryRegistry {
    descriptors: RwLock<HashMap<String, Arc<ResourceDescriptor>>>,
}

impl MemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the widget and part fixtures.
    #[must_use]
    pub fn with_fixtures() -> Self {
        let registry = Self::new();
        registry.register(widget_descriptor());
        registry.register(part_descriptor());
        registry
    }

    /// Registers a descriptor under its type name.
    pub fn register(&self, descriptor: ResourceDescriptor) {
        self.descriptors
            .write()
            .insert(descriptor.name.clone(), Arc::new(descriptor));
    }
}

impl SchemaRegistry for MemoryRegistry {
    fn descriptor(&self, type_name: &str) -> RestResult<Arc<ResourceDescriptor>> {
        self.descriptors
            .read()
            .get(type_name)
            .cloned()
            .ok_or_else(|| RestError::not_found(format!("Unknown resource type '{type_name}'.")))
    }
}

/// An in-memory [`Resource`] carrying an explicit attribute bag.
pub struct MemoryResource {
    /// The schema descriptor for this resource's type.
    pub descriptor: Arc<ResourceDescriptor>,
    /// The attribute values.
    pub attributes: AttributeMap,
    /// Validation errors recorded by the last save/delete.
    pub errors: FieldErrors,
    /// Whether the resource is unsaved.
    pub is_new: bool,
    /// Whether the resource was deleted during this request.
    pub deleted: bool,
    /// Eagerly loaded related data.
    pub embedded: IndexMap<String, Value>,
}

impl MemoryResource {
    /// Creates a new, unsaved resource with the descriptor's defaults.
    #[must_use]
    pub fn new(descriptor: Arc<ResourceDescriptor>) -> Self {
        let mut attributes = AttributeMap::new();
        for (name, attr) in &descriptor.attributes {
            if let Some(default) = &attr.default_value {
                attributes.insert(name.clone(), default.clone());
            }
        }
        Self {
            descriptor,
            attributes,
            errors: FieldErrors::new(),
            is_new: true,
            deleted: false,
            embedded: IndexMap::new(),
        }
    }

    fn from_row(descriptor: Arc<ResourceDescriptor>, row: AttributeMap) -> Self {
        Self {
            descriptor,
            attributes: row,
            errors: FieldErrors::new(),
            is_new: false,
            deleted: false,
            embedded: IndexMap::new(),
        }
    }
}

impl Resource for MemoryResource {
    fn type_name(&self) -> &str {
        &self.descriptor.name
    }

    fn attributes(&self) -> AttributeMap {
        self.attributes.clone()
    }

    fn set_attributes(&mut self, input: &AttributeMap) {
        for (name, value) in input {
            let writable = self
                .descriptor
                .attributes
                .get(name)
                .is_some_and(|attr| attr.is_writable);
            if writable {
                self.attributes.insert(name.clone(), value.clone());
            }
        }
    }

    fn primary_key(&self) -> Option<Value> {
        match self.descriptor.primary_key.as_slice() {
            [single] => self.attributes.get(single).filter(|v| !v.is_null()).cloned(),
            names => {
                let mut map = serde_json::Map::new();
                for name in names {
                    let value = self.attributes.get(name).filter(|v| !v.is_null())?;
                    map.insert(name.clone(), value.clone());
                }
                Some(Value::Object(map))
            }
        }
    }

    fn set_primary_key(&mut self, pk: Value) {
        match (&pk, self.descriptor.primary_key.as_slice()) {
            (Value::Object(map), _) => {
                for (name, value) in map {
                    self.attributes.insert(name.clone(), value.clone());
                }
            }
            (_, [single]) => {
                self.attributes.insert(single.clone(), pk);
            }
            _ => {}
        }
    }

    fn is_new(&self) -> bool {
        self.is_new
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    fn errors(&self) -> FieldErrors {
        self.errors.clone()
    }

    fn add_error(&mut self, attribute: &str, message: &str) {
        self.errors.add(attribute, message);
    }

    fn visible_attribute_names(&self) -> Vec<String> {
        self.descriptor.visible_attribute_names()
    }

    fn links(&self) -> IndexMap<String, Link> {
        let mut links = IndexMap::new();
        let Some(pk) = self.primary_key() else {
            return links;
        };
        links.insert(
            "self".to_string(),
            Link::new(format!(
                "/{}/{}",
                self.descriptor.path_segment(),
                crate::envelope::pk_string(&pk)
            )),
        );
        for (name, template) in &self.descriptor.links {
            let mut href = template.href.clone();
            for (attr, value) in &self.attributes {
                href = href.replace(
                    &format!("{{{attr}}}"),
                    &crate::envelope::pk_string(value),
                );
            }
            links.insert(
                name.clone(),
                Link {
                    title: template.title.clone(),
                    href,
                    profile: if template.profile.is_empty() {
                        None
                    } else {
                        Some(json!(template.profile))
                    },
                    templated: template.templated,
                },
            );
        }
        links
    }

    fn embedded(&self) -> IndexMap<String, Value> {
        self.embedded.clone()
    }

    fn instance_label(&self) -> Option<String> {
        self.attributes
            .get("name")
            .and_then(Value::as_str)
            .map(ToString::to_string)
    }
}

/// Builds a saved widget fixture.
#[must_use]
pub fn widget(id: i64, name: &str, color: &str) -> MemoryResource {
    let mut row = AttributeMap::new();
    row.insert("id".to_string(), json!(id));
    row.insert("name".to_string(), json!(name));
    row.insert("color".to_string(), json!(color));
    row.insert("locked".to_string(), json!(false));
    MemoryResource::from_row(Arc::new(widget_descriptor()), row)
}

/// An in-memory [`ResourceStore`] over the registered descriptors.
///
/// Validation is schema-driven: required attributes must be present and
/// non-null on save, and a truthy `locked` attribute blocks deletion.
pub struct MemoryStore {
    registry: Arc<MemoryRegistry>,
    rows: RwLock<HashMap<String, Vec<AttributeMap>>>,
}

impl MemoryStore {
    /// Creates an empty store over the given registry.
    #[must_use]
    pub fn new(registry: Arc<MemoryRegistry>) -> Self {
        Self {
            registry,
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a raw row without validation.
    pub fn seed(&self, type_name: &str, row: AttributeMap) {
        self.rows
            .write()
            .entry(type_name.to_string())
            .or_default()
            .push(row);
    }

    fn descriptor(&self, type_name: &str) -> RestResult<Arc<ResourceDescriptor>> {
        self.registry.descriptor(type_name)
    }

    fn pk_matches(descriptor: &ResourceDescriptor, row: &AttributeMap, pk: &Value) -> bool {
        match descriptor.primary_key.as_slice() {
            [single] => row.get(single).is_some_and(|v| values_equal(v, pk)),
            names => match pk {
                Value::Object(map) => names.iter().all(|name| {
                    match (row.get(name), map.get(name)) {
                        (Some(a), Some(b)) => values_equal(a, b),
                        _ => false,
                    }
                }),
                _ => false,
            },
        }
    }

    fn matches(row: &AttributeMap, criteria: &Criteria) -> bool {
        if let Some(q) = &criteria.query {
            let q = q.to_lowercase();
            let hit = row.values().any(|value| match value {
                Value::String(s) => s.to_lowercase().contains(&q),
                other => other.to_string().contains(&q),
            });
            if !hit {
                return false;
            }
        }
        for (name, expected) in &criteria.filter {
            let hit = row.get(name).is_some_and(|v| values_equal(v, expected));
            if !hit {
                return false;
            }
        }
        true
    }

    fn embed_related(
        &self,
        descriptor: &ResourceDescriptor,
        resource: &mut MemoryResource,
        criteria: &Criteria,
    ) -> RestResult<()> {
        for name in &criteria.embed {
            let Some(template) = descriptor.relation_link(name) else {
                return Err(RestError::unknown_embed(name.clone()));
            };
            let Some(spec) = template.relation.as_ref() else {
                return Err(RestError::unknown_embed(name.clone()));
            };
            let target = template
                .profile
                .first()
                .ok_or_else(|| RestError::unknown_embed(name.clone()))?;
            let rows = self.rows.read();
            let related = rows.get(target.as_str()).cloned().unwrap_or_default();

            let value = match spec.kind {
                RelationKind::HasMany => {
                    let fk = spec.foreign_key.as_deref().unwrap_or_default();
                    let pk = resource.primary_key().unwrap_or(Value::Null);
                    let items: Vec<Value> = related
                        .iter()
                        .filter(|row| row.get(fk).is_some_and(|v| values_equal(v, &pk)))
                        .map(row_value)
                        .collect();
                    Value::Array(items)
                }
                RelationKind::BelongsTo | RelationKind::HasOne => {
                    let fk = spec.foreign_key.as_deref().unwrap_or_default();
                    let target_descriptor = self.descriptor(target)?;
                    let key = match spec.kind {
                        RelationKind::BelongsTo => {
                            resource.attributes.get(fk).cloned().unwrap_or(Value::Null)
                        }
                        _ => resource.primary_key().unwrap_or(Value::Null),
                    };
                    related
                        .iter()
                        .find(|row| match spec.kind {
                            RelationKind::BelongsTo => {
                                Self::pk_matches(&target_descriptor, row, &key)
                            }
                            _ => row.get(fk).is_some_and(|v| values_equal(v, &key)),
                        })
                        .map_or(Value::Null, row_value)
                }
                RelationKind::ManyToMany => Value::Array(Vec::new()),
            };
            resource.embedded.insert(name.clone(), value);
        }
        Ok(())
    }

    fn validate(descriptor: &ResourceDescriptor, resource: &MemoryResource) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for (name, attr) in &descriptor.attributes {
            if !attr.is_required || attr.is_primary_key {
                continue;
            }
            let missing = resource
                .attributes
                .get(name)
                .map_or(true, |v| v.is_null() || v.as_str().is_some_and(str::is_empty));
            if missing {
                errors.add(name, format!("{} cannot be blank.", attr.label));
            }
        }
        errors
    }

    fn next_id(&self, type_name: &str) -> i64 {
        let rows = self.rows.read();
        rows.get(type_name)
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.get("id").and_then(Value::as_i64))
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0)
            + 1
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    // Path and query parameters arrive as strings; compare leniently.
    match (a, b) {
        (Value::String(s), other) | (other, Value::String(s)) => &other.to_string() == s,
        _ => false,
    }
}

fn row_value(row: &AttributeMap) -> Value {
    let map: serde_json::Map<String, Value> =
        row.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    Value::Object(map)
}

impl ResourceStore for MemoryStore {
    fn find_by_primary_key(
        &self,
        type_name: &str,
        pk: &Value,
        criteria: &Criteria,
    ) -> RestResult<Option<Box<dyn Resource>>> {
        let descriptor = self.descriptor(type_name)?;
        let row = {
            let rows = self.rows.read();
            rows.get(type_name).and_then(|rows| {
                rows.iter()
                    .find(|row| Self::pk_matches(&descriptor, row, pk))
                    .cloned()
            })
        };
        let Some(row) = row else {
            return Ok(None);
        };
        let mut resource = MemoryResource::from_row(Arc::clone(&descriptor), row);
        self.embed_related(&descriptor, &mut resource, criteria)?;
        Ok(Some(Box::new(resource)))
    }

    fn search(&self, type_name: &str, criteria: &Criteria) -> RestResult<SearchPage> {
        let descriptor = self.descriptor(type_name)?;
        let matched: Vec<AttributeMap> = {
            let rows = self.rows.read();
            rows.get(type_name)
                .map(|rows| {
                    rows.iter()
                        .filter(|row| Self::matches(row, criteria))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };
        let total = matched.len() as u64;

        let page = criteria.page.unwrap_or(0) as usize;
        let paged: Vec<AttributeMap> = match criteria.limit {
            Some(limit) => matched
                .into_iter()
                .skip(page * limit as usize)
                .take(limit as usize)
                .collect(),
            None => matched,
        };

        let mut items: Vec<Box<dyn Resource>> = Vec::with_capacity(paged.len());
        for row in paged {
            let mut resource = MemoryResource::from_row(Arc::clone(&descriptor), row);
            self.embed_related(&descriptor, &mut resource, criteria)?;
            items.push(Box::new(resource));
        }
        Ok(SearchPage { items, total })
    }

    fn instantiate(&self, type_name: &str, _scenario: &str) -> RestResult<Box<dyn Resource>> {
        let descriptor = self.descriptor(type_name)?;
        Ok(Box::new(MemoryResource::new(descriptor)))
    }

    fn save(&self, resource: &mut dyn Resource) -> RestResult<bool> {
        let type_name = resource.type_name().to_string();
        let descriptor = self.descriptor(&type_name)?;

        // Validation only needs the attribute snapshot and the descriptor,
        // so no downcasting through Any is required.
        let probe = MemoryResource {
            descriptor: Arc::clone(&descriptor),
            attributes: resource.attributes(),
            errors: FieldErrors::new(),
            is_new: resource.is_new(),
            deleted: false,
            embedded: IndexMap::new(),
        };
        let errors = Self::validate(&descriptor, &probe);
        if !errors.is_empty() {
            for (name, messages) in &errors.fields {
                for message in messages {
                    resource.add_error(name, message);
                }
            }
            return Ok(false);
        }

        let pk = match resource.primary_key() {
            Some(pk) => pk,
            None => {
                let id = Value::from(self.next_id(&type_name));
                resource.set_primary_key(id.clone());
                id
            }
        };

        let row: AttributeMap = resource.attributes();
        let mut rows = self.rows.write();
        let bucket = rows.entry(type_name).or_default();
        if let Some(existing) = bucket
            .iter_mut()
            .find(|candidate| Self::pk_matches(&descriptor, candidate, &pk))
        {
            *existing = row;
        } else {
            bucket.push(row);
        }
        Ok(true)
    }

    fn delete(&self, resource: &mut dyn Resource) -> RestResult<bool> {
        let type_name = resource.type_name().to_string();
        let descriptor = self.descriptor(&type_name)?;
        let Some(pk) = resource.primary_key() else {
            return Err(RestError::unexpected("Cannot delete an unsaved resource."));
        };

        if resource
            .attributes()
            .get("locked")
            .is_some_and(|v| v.as_bool() == Some(true))
        {
            resource.add_error("locked", "The resource is locked and cannot be deleted.");
            return Ok(false);
        }

        let mut rows = self.rows.write();
        let Some(bucket) = rows.get_mut(&type_name) else {
            return Ok(true);
        };
        bucket.retain(|row| !Self::pk_matches(&descriptor, row, &pk));
        Ok(true)
    }

    fn stats(&self, resource: &dyn Resource) -> RestResult<Value> {
        Ok(json!({
            "attributeCount": resource.attributes().len(),
        }))
    }

    fn aggregate(&self, type_name: &str) -> RestResult<Value> {
        let rows = self.rows.read();
        let count = rows.get(type_name).map_or(0, Vec::len);
        Ok(json!({ "count": count }))
    }
}

/// Seeds a store with `n` widgets named `widget-1..=n`, alternating colors.
#[must_use]
pub fn store_with_widgets(n: usize) -> MemoryStore {
    let registry = Arc::new(MemoryRegistry::with_fixtures());
    let store = MemoryStore::new(registry);
    let colors = ["red", "green", "blue"];
    for i in 1..=n {
        let mut row = AttributeMap::new();
        row.insert("id".to_string(), json!(i as i64));
        row.insert("name".to_string(), json!(format!("widget-{i}")));
        row.insert("color".to_string(), json!(colors[i % colors.len()]));
        row.insert("locked".to_string(), json!(false));
        store.seed("widgets", row);
    }
    store
}

/// An event stream that records everything published to it.
#[derive(Default)]
pub struct RecordingEventStream {
    events: Mutex<Vec<ChangeEvent>>,
}

impl RecordingEventStream {
    /// Creates an empty recording stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the published events.
    #[must_use]
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().clone()
    }
}

impl EventStream for RecordingEventStream {
    fn publish(&self, event: &ChangeEvent) -> bool {
        self.events.lock().push(event.clone());
        true
    }
}

/// An event stream that rejects every publish, for failure-path tests.
pub struct FailingEventStream;

impl EventStream for FailingEventStream {
    fn publish(&self, _event: &ChangeEvent) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_applies_query_and_paging() {
        let store = store_with_widgets(25);
        let criteria = Criteria::new().with_limit(10).with_page(2);
        let page = store.search("widgets", &criteria).unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.items.len(), 5);

        let criteria = Criteria::new().with_query("widget-7");
        let page = store.search("widgets", &criteria).unwrap();
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_save_validates_required_attributes() {
        let store = store_with_widgets(0);
        let mut resource = store.instantiate("widgets", "create").unwrap();
        assert!(!store.save(resource.as_mut()).unwrap());
        assert!(resource.has_errors());
    }

    #[test]
    fn test_save_assigns_primary_key() {
        let store = store_with_widgets(2);
        let mut resource = store.instantiate("widgets", "create").unwrap();
        let mut input = AttributeMap::new();
        input.insert("name".to_string(), json!("gadget"));
        resource.set_attributes(&input);

        assert!(store.save(resource.as_mut()).unwrap());
        assert_eq!(resource.primary_key(), Some(json!(3)));
    }

    #[test]
    fn test_locked_resource_blocks_delete() {
        let store = store_with_widgets(0);
        let mut row = AttributeMap::new();
        row.insert("id".to_string(), json!(1));
        row.insert("name".to_string(), json!("anvil"));
        row.insert("locked".to_string(), json!(true));
        store.seed("widgets", row);

        let mut resource = store
            .find_by_primary_key("widgets", &json!(1), &Criteria::new())
            .unwrap()
            .unwrap();
        assert!(!store.delete(resource.as_mut()).unwrap());
        assert!(resource.has_errors());
    }

    #[test]
    fn test_embed_resolves_has_many() {
        let store = store_with_widgets(1);
        let mut part = AttributeMap::new();
        part.insert("id".to_string(), json!(1));
        part.insert("widgetId".to_string(), json!(1));
        part.insert("label".to_string(), json!("bolt"));
        store.seed("parts", part);

        let criteria = Criteria::new().with_embed("parts");
        let resource = store
            .find_by_primary_key("widgets", &json!(1), &criteria)
            .unwrap()
            .unwrap();
        let embedded = resource.embedded();
        assert_eq!(embedded["parts"][0]["label"], json!("bolt"));
    }

    #[test]
    fn test_embed_unknown_relation_fails() {
        let store = store_with_widgets(1);
        let criteria = Criteria::new().with_embed("bogus");
        let err = store
            .find_by_primary_key("widgets", &json!(1), &criteria)
            .err()
            .unwrap();
        assert!(matches!(err, RestError::UnknownEmbed { .. }));
    }

    #[test]
    fn test_pk_string_match_is_lenient() {
        let store = store_with_widgets(1);
        let found = store
            .find_by_primary_key("widgets", &json!("1"), &Criteria::new())
            .unwrap();
        assert!(found.is_some());
    }
}
