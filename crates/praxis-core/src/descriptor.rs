//! Resource schema descriptors.
//!
//! A [`ResourceDescriptor`] is the read-only schema facet of a resource
//! type: attribute metadata, link templates, and the actions available on
//! items and collections. Descriptors are built once per type by the
//! [`crate::SchemaRegistry`] and never mutated afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Value;

/// The primitive type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    /// A UTF-8 string.
    String,
    /// A whole number.
    Integer,
    /// A floating point number.
    Float,
    /// A boolean.
    Boolean,
    /// An array of values.
    Array,
}

/// The declared type of an action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Cast to string.
    String,
    /// Cast to integer.
    Integer,
    /// Cast to float.
    Float,
    /// Cast to boolean.
    Boolean,
    /// Cast to array.
    Array,
    /// Cast to object.
    Object,
}

/// Whether an action targets a single resource or a collection.
///
/// Replaces the original duck-typed single/multiple target marker
/// interfaces with a field inspected directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetArity {
    /// The action targets one identified resource.
    Item,
    /// The action targets the resource collection.
    Collection,
}

/// Schema metadata for a single attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDescriptor {
    /// Human-readable label.
    pub label: String,
    /// Longer description, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The primitive value type.
    pub primitive: PrimitiveType,
    /// The semantic type (e.g. `enum`, `date`, `datetime`), if any.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub semantic: Option<String>,
    /// The display format (e.g. `number`, `boolean`, `choice`), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Whether the attribute accepts user input.
    pub is_writable: bool,
    /// Whether the attribute must be present on save.
    pub is_required: bool,
    /// Whether the attribute is part of the primary key.
    pub is_primary_key: bool,
    /// Client-side validator descriptions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<String>,
    /// Default value applied on instantiation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Value-to-label map for enum-like attributes, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_labels: Option<IndexMap<String, String>>,
}

impl AttributeDescriptor {
    /// Creates a writable, optional attribute with the given label and type.
    #[must_use]
    pub fn new(label: impl Into<String>, primitive: PrimitiveType) -> Self {
        Self {
            label: label.into(),
            description: None,
            primitive,
            semantic: None,
            format: None,
            is_writable: true,
            is_required: false,
            is_primary_key: false,
            validators: Vec::new(),
            default_value: None,
            enum_labels: None,
        }
    }

    /// Marks the attribute as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Marks the attribute as a read-only primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_writable = false;
        self
    }

    /// Marks the attribute as read-only.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.is_writable = false;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// The kind of a relation between two resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    /// The owner holds the foreign key.
    BelongsTo,
    /// One related resource holds the owner's key.
    HasOne,
    /// Many related resources hold the owner's key.
    HasMany,
    /// Related through a junction.
    ManyToMany,
}

/// Relation metadata attached to a link template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationSpec {
    /// The relation kind.
    pub kind: RelationKind,
    /// The foreign key attribute on the related type, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
}

/// A declared link from a resource type to a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkTemplate {
    /// The link name (also the `_embed` name for relations).
    pub name: String,
    /// Human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Literal or templated target URL.
    pub href: String,
    /// Target resource type name(s).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,
    /// Whether `href` contains template placeholders.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub templated: bool,
    /// Relation metadata when the link names a relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationSpec>,
}

impl LinkTemplate {
    /// Creates a plain link template.
    #[must_use]
    pub fn new(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            href: href.into(),
            profile: Vec::new(),
            templated: false,
            relation: None,
        }
    }

    /// Creates a relation link template targeting `profile`.
    #[must_use]
    pub fn relation(
        name: impl Into<String>,
        href: impl Into<String>,
        profile: impl Into<String>,
        spec: RelationSpec,
    ) -> Self {
        Self {
            name: name.into(),
            title: None,
            href: href.into(),
            profile: vec![profile.into()],
            templated: false,
            relation: Some(spec),
        }
    }
}

/// A runtime link on a populated resource or collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Human-readable title, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The target URL.
    pub href: String,
    /// Target resource type name(s), if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,
    /// Whether `href` is a template.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub templated: bool,
}

impl Link {
    /// Creates a plain link.
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            title: None,
            href: href.into(),
            profile: None,
            templated: false,
        }
    }

    /// Creates a titled link.
    #[must_use]
    pub fn titled(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            href: href.into(),
            profile: None,
            templated: false,
        }
    }

    /// Creates a templated link.
    #[must_use]
    pub fn templated(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            href: href.into(),
            profile: None,
            templated: true,
        }
    }
}

/// A declared action parameter, used both for self-description via
/// Options and for request parameter coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamDescriptor {
    /// The parameter name.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Longer description, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter must be present.
    pub required: bool,
    /// The type the raw value is coerced to.
    #[serde(rename = "type")]
    pub param_type: ParamType,
    /// Fallback applied silently when the parameter is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamDescriptor {
    /// Creates an optional string parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: None,
            required: false,
            param_type: ParamType::String,
            default: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the parameter required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the coercion type.
    #[must_use]
    pub fn typed(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// A declared request header for an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderDescriptor {
    /// The header name.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Longer description, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the header must be present.
    pub required: bool,
}

/// Self-description of a registered action, as returned by Options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    /// Human-readable label.
    pub label: String,
    /// Longer description.
    pub description: String,
    /// The HTTP verb, or `None` for lenient actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
    /// Declared parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamDescriptor>,
    /// Declared request headers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<HeaderDescriptor>,
    /// Templated link to invoke the action.
    pub link: Link,
}

/// The read-only schema facet of a resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    /// The type name: camelCase and plural, matching the route segment
    /// (dash-cased) and the `_embedded` container key in collection
    /// envelopes.
    pub name: String,
    /// Human-readable singular label.
    pub label: String,
    /// Human-readable plural label.
    pub plural_label: String,
    /// Ordered primary key attribute names.
    pub primary_key: Vec<String>,
    /// Attribute metadata in declaration order.
    pub attributes: IndexMap<String, AttributeDescriptor>,
    /// Declared links, including relations.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, LinkTemplate>,
}

impl ResourceDescriptor {
    /// Returns the visible attribute names: primary key first, then the
    /// remaining declared attributes in order.
    #[must_use]
    pub fn visible_attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.primary_key.clone();
        for name in self.attributes.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Returns the link template for a named relation, if declared.
    #[must_use]
    pub fn relation_link(&self, name: &str) -> Option<&LinkTemplate> {
        self.links
            .get(name)
            .filter(|link| link.relation.is_some())
    }

    /// Returns the dash-case collection path segment for this type
    /// (e.g. `purchaseOrder` → `purchase-order`).
    #[must_use]
    pub fn path_segment(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + 2);
        for ch in self.name.chars() {
            if ch.is_ascii_uppercase() {
                out.push('-');
                out.push(ch.to_ascii_lowercase());
            } else {
                out.push(ch);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ResourceDescriptor {
        let mut attributes = IndexMap::new();
        attributes.insert(
            "id".to_string(),
            AttributeDescriptor::new("ID", PrimitiveType::Integer).primary_key(),
        );
        attributes.insert(
            "name".to_string(),
            AttributeDescriptor::new("Name", PrimitiveType::String).required(),
        );
        ResourceDescriptor {
            name: "purchaseOrders".to_string(),
            label: "Purchase Order".to_string(),
            plural_label: "Purchase Orders".to_string(),
            primary_key: vec!["id".to_string()],
            attributes,
            links: IndexMap::new(),
        }
    }

    #[test]
    fn test_visible_names_pk_first() {
        let descriptor = descriptor();
        assert_eq!(descriptor.visible_attribute_names(), vec!["id", "name"]);
    }

    #[test]
    fn test_path_segment_dash_case() {
        assert_eq!(descriptor().path_segment(), "purchase-orders");
    }

    #[test]
    fn test_relation_link_ignores_plain_links() {
        let mut descriptor = descriptor();
        descriptor.links.insert(
            "self".to_string(),
            LinkTemplate::new("self", "/purchase-orders/{id}"),
        );
        assert!(descriptor.relation_link("self").is_none());

        descriptor.links.insert(
            "lines".to_string(),
            LinkTemplate::relation(
                "lines",
                "/purchase-orders/{id}/lines",
                "orderLines",
                RelationSpec {
                    kind: RelationKind::HasMany,
                    foreign_key: Some("orderId".to_string()),
                },
            ),
        );
        assert!(descriptor.relation_link("lines").is_some());
    }
}
