//! # Praxis Core
//!
//! Core types and collaborator traits for the Praxis resource framework.
//!
//! This crate provides the foundational pieces used throughout Praxis:
//!
//! - [`Criteria`] - Composable search/filter/pagination/embed descriptor
//! - [`ResourceDescriptor`] - Schema facet of a resource type
//! - [`Resource`] / [`ResourceStore`] - The persistence boundary
//! - [`SchemaRegistry`] - Descriptor lookup with load-once caching
//! - [`EventStream`] - Fire-and-forget change notification
//! - [`RestError`] - Standard error taxonomy
//! - [`ActionResult`] - The universal action-to-envelope contract
//! - [`envelope`] - HAL-style `_embedded`/`_links`/`_errors` builders

#![doc(html_root_url = "https://docs.rs/praxis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod criteria;
mod descriptor;
mod error;
pub mod envelope;
mod event;
pub mod fixtures;
mod resource;
mod result;
mod schema;
mod store;

pub use criteria::{Criteria, Scope};
pub use descriptor::{
    ActionDescriptor, AttributeDescriptor, HeaderDescriptor, Link, LinkTemplate, ParamDescriptor,
    ParamType, PrimitiveType, RelationKind, RelationSpec, ResourceDescriptor, TargetArity,
};
pub use error::{ErrorKind, FieldErrors, RestError, RestResult};
pub use event::{emit, ChangeEvent, EventStream, LocalEventStream};
pub use resource::Resource;
pub use result::{ActionResult, Collection, Payload};
pub use schema::{CachedRegistry, SchemaRegistry};
pub use store::{ResourceStore, SearchPage};

/// The dynamic value type used for attribute data.
pub type Value = serde_json::Value;

/// An ordered attribute map, the explicit replacement for the original
/// dynamic attribute bags.
pub type AttributeMap = indexmap::IndexMap<String, Value>;
