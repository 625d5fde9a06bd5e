//! The action kind table.
//!
//! Every action is a [`Kind`] plus shared machinery, not a class
//! hierarchy: the kind decides the verb, the target arity, the declared
//! parameters and headers, and which branch of the state machine runs.

use praxis_core::{
    ActionDescriptor, HeaderDescriptor, Link, ParamDescriptor, ParamType, ResourceDescriptor,
    TargetArity,
};

/// The supported resource actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// Create a new resource in the collection.
    Create,
    /// Read one resource by primary key.
    Read,
    /// Update an existing resource.
    Update,
    /// Replace an existing resource (PUT semantics).
    Replace,
    /// Delete a resource.
    Delete,
    /// Search the collection.
    Search,
    /// Collection-level statistics.
    Aggregate,
    /// Item-level statistics.
    Stats,
    /// Schema and action self-description.
    Options,
    /// Echo request metadata.
    Trace,
    /// Copy a resource to a destination.
    Copy,
    /// Reserved bulk operations.
    Bulk,
    /// Create a resource in a relation's collection.
    CreateRelated,
    /// Read one related resource.
    ReadRelated,
    /// Search a relation's collection.
    SearchRelated,
    /// A host-registered custom action.
    Custom(String),
}

impl Kind {
    /// The action name as it appears in routes and scenarios.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Replace => "replace",
            Self::Delete => "delete",
            Self::Search => "search",
            Self::Aggregate => "aggregate",
            Self::Stats => "stats",
            Self::Options => "options",
            Self::Trace => "trace",
            Self::Copy => "copy",
            Self::Bulk => "bulk",
            Self::CreateRelated => "createRelated",
            Self::ReadRelated => "readRelated",
            Self::SearchRelated => "searchRelated",
            Self::Custom(name) => name,
        }
    }

    /// Resolves a route action name, including the `Related` variants.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "create" => Self::Create,
            "read" => Self::Read,
            "update" => Self::Update,
            "replace" => Self::Replace,
            "delete" => Self::Delete,
            "search" => Self::Search,
            "aggregate" => Self::Aggregate,
            "stats" => Self::Stats,
            "options" => Self::Options,
            "trace" => Self::Trace,
            "copy" => Self::Copy,
            "bulk" => Self::Bulk,
            "createRelated" => Self::CreateRelated,
            "readRelated" => Self::ReadRelated,
            "searchRelated" => Self::SearchRelated,
            other => Self::Custom(other.to_string()),
        }
    }

    /// The HTTP verb this action answers to, or `None` for lenient
    /// actions that accept any verb.
    #[must_use]
    pub fn verb(&self) -> Option<&'static str> {
        match self {
            Self::Create | Self::Update | Self::Bulk | Self::CreateRelated => Some("POST"),
            Self::Read
            | Self::Search
            | Self::Aggregate
            | Self::Stats
            | Self::ReadRelated
            | Self::SearchRelated => Some("GET"),
            Self::Replace => Some("PUT"),
            Self::Delete => Some("DELETE"),
            Self::Options => Some("OPTIONS"),
            Self::Copy => Some("COPY"),
            Self::Trace | Self::Custom(_) => None,
        }
    }

    /// Whether the action targets one resource or the collection.
    /// Options and Trace adapt at runtime; their static arity is the
    /// collection.
    #[must_use]
    pub fn arity(&self) -> TargetArity {
        match self {
            Self::Read
            | Self::Update
            | Self::Replace
            | Self::Delete
            | Self::Stats
            | Self::Copy
            | Self::ReadRelated => TargetArity::Item,
            _ => TargetArity::Collection,
        }
    }

    /// The scenario name used when instantiating and saving resources,
    /// and as the change-event name.
    #[must_use]
    pub fn scenario(&self) -> &str {
        match self {
            Self::CreateRelated => "create",
            Self::ReadRelated => "read",
            Self::SearchRelated => "search",
            other => other.name(),
        }
    }

    /// Whether this kind operates through a named relation.
    #[must_use]
    pub fn is_relation(&self) -> bool {
        matches!(
            self,
            Self::CreateRelated | Self::ReadRelated | Self::SearchRelated
        )
    }

    /// The declared request parameters for this action.
    #[must_use]
    pub fn params(&self) -> Vec<ParamDescriptor> {
        let mut params = Vec::new();
        if matches!(self, Self::Search | Self::SearchRelated) {
            params.push(
                ParamDescriptor::new("q", "Query")
                    .description("The search query text")
                    .typed(ParamType::String),
            );
        }
        if self.is_relation() {
            params.push(
                ParamDescriptor::new("relation", "Relation Name")
                    .description("The name of the relation to operate on")
                    .required()
                    .typed(ParamType::String),
            );
        }
        params
    }

    /// The declared request headers for this action.
    #[must_use]
    pub fn request_headers(&self) -> Vec<HeaderDescriptor> {
        if matches!(self, Self::Copy) {
            vec![HeaderDescriptor {
                name: "Destination".to_string(),
                label: "Destination".to_string(),
                description: Some("The destination URL to copy the resource to.".to_string()),
                required: true,
            }]
        } else {
            Vec::new()
        }
    }

    /// A human-readable label templated from the resource labels.
    #[must_use]
    pub fn label(&self, descriptor: &ResourceDescriptor) -> String {
        match self {
            Self::Create | Self::CreateRelated => format!("Create {}", descriptor.label),
            Self::Read | Self::ReadRelated => format!("Read {}", descriptor.label),
            Self::Update => format!("Update {}", descriptor.label),
            Self::Replace => format!("Replace {}", descriptor.label),
            Self::Delete => format!("Delete {}", descriptor.label),
            Self::Search | Self::SearchRelated => format!("Search {}", descriptor.plural_label),
            Self::Aggregate => format!("{} Aggregate Stats", descriptor.label),
            Self::Stats => format!("{} Stats", descriptor.label),
            Self::Options => format!("{} Options", descriptor.label),
            Self::Trace => format!("{} Trace", descriptor.label),
            Self::Copy => format!("Copy {}", descriptor.label),
            Self::Bulk => format!("Bulk {}", descriptor.plural_label),
            Self::Custom(name) => format!("{name} {}", descriptor.label),
        }
    }

    /// A short human-readable description templated from the resource
    /// labels.
    #[must_use]
    pub fn description(&self, descriptor: &ResourceDescriptor) -> String {
        let label = &descriptor.label;
        let plural = &descriptor.plural_label;
        match self {
            Self::Create | Self::CreateRelated => format!("Creates a new {label}."),
            Self::Read | Self::ReadRelated => format!("Reads the specified {label}."),
            Self::Update => format!("Update / edit the specified {label}."),
            Self::Replace => format!("Replace the specified {label}."),
            Self::Delete => format!("Delete the specified {label}."),
            Self::Search | Self::SearchRelated => {
                format!("Searches for {plural} that optionally match a given filter.")
            }
            Self::Aggregate => format!("Gets the aggregate statistics for {plural}."),
            Self::Stats => format!("Gets the statistics for the given {label}."),
            Self::Options => format!("Displays the options for {plural}."),
            Self::Trace => format!("Traces a request for {plural}."),
            Self::Copy => format!("Copies the {label} to another location."),
            Self::Bulk => format!("Bulk operations on {plural}."),
            Self::Custom(name) => format!("Runs the {name} action on {plural}."),
        }
    }

    /// Builds the self-description returned by the Options action.
    #[must_use]
    pub fn describe(&self, descriptor: &ResourceDescriptor) -> ActionDescriptor {
        let base = format!("/{}", descriptor.path_segment());
        let href = match self.arity() {
            TargetArity::Item => format!("{base}/{{id}}/_{}", self.name()),
            TargetArity::Collection => format!("{base}/_{}", self.name()),
        };
        ActionDescriptor {
            label: self.label(descriptor),
            description: self.description(descriptor),
            verb: self.verb().map(ToString::to_string),
            params: self.params(),
            headers: self.request_headers(),
            link: Link {
                title: Some(self.label(descriptor)),
                href,
                profile: None,
                templated: true,
            },
        }
    }

    /// The item-level kinds advertised by the Options action.
    #[must_use]
    pub fn item_kinds() -> &'static [Self] {
        &[
            Self::Read,
            Self::Update,
            Self::Replace,
            Self::Delete,
            Self::Stats,
            Self::Copy,
        ]
    }

    /// The collection-level kinds advertised by the Options action.
    #[must_use]
    pub fn collection_kinds() -> &'static [Self] {
        &[Self::Create, Self::Search, Self::Aggregate, Self::Bulk]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_core::fixtures::widget_descriptor;

    #[test]
    fn test_verbs() {
        assert_eq!(Kind::Create.verb(), Some("POST"));
        assert_eq!(Kind::Update.verb(), Some("POST"));
        assert_eq!(Kind::Replace.verb(), Some("PUT"));
        assert_eq!(Kind::Copy.verb(), Some("COPY"));
        assert_eq!(Kind::Trace.verb(), None);
    }

    #[test]
    fn test_arity() {
        assert_eq!(Kind::Read.arity(), TargetArity::Item);
        assert_eq!(Kind::Search.arity(), TargetArity::Collection);
        assert_eq!(Kind::ReadRelated.arity(), TargetArity::Item);
    }

    #[test]
    fn test_name_round_trip() {
        for kind in [Kind::Create, Kind::SearchRelated, Kind::Bulk] {
            assert_eq!(Kind::from_name(kind.name()), kind);
        }
        assert_eq!(
            Kind::from_name("publish"),
            Kind::Custom("publish".to_string())
        );
    }

    #[test]
    fn test_describe_templated_link() {
        let descriptor = widget_descriptor();
        let described = Kind::Read.describe(&descriptor);
        assert_eq!(described.label, "Read Widget");
        assert_eq!(described.link.href, "/widgets/{id}/_read");
        assert!(described.link.templated);

        let described = Kind::Search.describe(&descriptor);
        assert_eq!(described.link.href, "/widgets/_search");
        assert_eq!(described.params[0].name, "q");
    }

    #[test]
    fn test_copy_declares_destination_header() {
        let headers = Kind::Copy.request_headers();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].name, "Destination");
        assert!(headers[0].required);
    }
}
