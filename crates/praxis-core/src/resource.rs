//! The resource boundary trait.

use indexmap::IndexMap;

use crate::{AttributeMap, FieldErrors, Link, Value};

/// A typed, identifiable record exposed over HTTP.
///
/// Implementations wrap whatever the host persistence layer produces (a
/// database row, a document, an in-memory struct). The attribute bag is
/// explicit: no dynamic property dispatch, just an ordered
/// [`AttributeMap`] plus the metadata methods below.
///
/// One instance belongs to one request; `Send` is required so boxed
/// resources can cross the host's worker boundary, but nothing in the
/// core shares a resource between threads.
pub trait Resource: Send {
    /// The resource type name (camelCase, singular).
    fn type_name(&self) -> &str;

    /// Returns a snapshot of all attribute values.
    fn attributes(&self) -> AttributeMap;

    /// Applies user input to the writable attributes. Non-writable keys
    /// are ignored; this is assignment, not validation.
    fn set_attributes(&mut self, input: &AttributeMap);

    /// Returns the primary key value, or `None` when unset. Composite
    /// keys are represented as an object value.
    fn primary_key(&self) -> Option<Value>;

    /// Sets the primary key value.
    fn set_primary_key(&mut self, pk: Value);

    /// Returns `true` if the resource has not been persisted yet.
    fn is_new(&self) -> bool;

    /// Returns `true` if the resource was deleted during this request.
    fn is_deleted(&self) -> bool {
        false
    }

    /// Marks the resource as deleted so the envelope can carry the
    /// `_deleted` flag. The default is a no-op for read-only resources.
    fn mark_deleted(&mut self) {}

    /// Returns the validation errors recorded by the last save/delete.
    fn errors(&self) -> FieldErrors;

    /// Records a validation error against an attribute. Stores call this
    /// when a save or delete is refused.
    fn add_error(&mut self, attribute: &str, message: &str);

    /// Returns `true` if any validation errors are recorded.
    fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    /// The attribute names exposed in responses, in order.
    fn visible_attribute_names(&self) -> Vec<String>;

    /// The links for this resource. A populated resource always carries a
    /// `self` link; the envelope builder synthesizes one if absent.
    fn links(&self) -> IndexMap<String, Link>;

    /// Eagerly loaded related data, relation name to prepared value
    /// (object for to-one, array for to-many).
    fn embedded(&self) -> IndexMap<String, Value> {
        IndexMap::new()
    }

    /// A human-readable label for this instance, if any.
    fn instance_label(&self) -> Option<String> {
        None
    }
}
