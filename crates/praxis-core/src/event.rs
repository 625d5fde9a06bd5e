//! Change events and the event stream collaborator.
//!
//! After a successful save or delete, actions publish a [`ChangeEvent`]
//! describing what changed. Delivery is fire-and-forget: a failing or
//! panicking stream never alters the action's outcome.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{AttributeMap, Value};

/// A change notification for a single resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// The event name, usually the action scenario (`create`, `update`,
    /// `replace`, `delete`).
    pub name: String,
    /// The resource type name.
    pub resource_type: String,
    /// The resource primary key, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<Value>,
    /// Attribute name to `(old, new)` value pairs. Attributes absent
    /// before the change carry `null` as the old value.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub params: IndexMap<String, (Value, Value)>,
}

impl ChangeEvent {
    /// Creates an event with no attribute diff.
    #[must_use]
    pub fn new(name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_type: resource_type.into(),
            primary_key: None,
            params: IndexMap::new(),
        }
    }

    /// Sets the primary key.
    #[must_use]
    pub fn with_primary_key(mut self, pk: Value) -> Self {
        self.primary_key = Some(pk);
        self
    }

    /// Computes the attribute diff between two snapshots and attaches it.
    ///
    /// Attributes present only in `new` are recorded as `(null, value)`;
    /// unchanged attributes are omitted.
    #[must_use]
    pub fn with_diff(mut self, old: &AttributeMap, new: &AttributeMap) -> Self {
        for (name, value) in new {
            match old.get(name) {
                Some(previous) if previous == value => {}
                Some(previous) => {
                    self.params
                        .insert(name.clone(), (previous.clone(), value.clone()));
                }
                None => {
                    self.params
                        .insert(name.clone(), (Value::Null, value.clone()));
                }
            }
        }
        self
    }
}

/// A pluggable change-event sink.
///
/// Implementations range from in-process callback fan-out to message
/// buses and pub/sub channels; all are interchangeable behind `publish`.
/// There is no delivery guarantee beyond the publish call succeeding.
pub trait EventStream: Send + Sync {
    /// Publishes an event. Returns `false` when the stream rejected it.
    fn publish(&self, event: &ChangeEvent) -> bool;
}

/// Publishes an event, swallowing failures.
///
/// The emission side effect must never block or fail the primary
/// save/delete outcome, so rejections are logged and dropped here.
pub fn emit(stream: &dyn EventStream, event: &ChangeEvent) {
    if !stream.publish(event) {
        tracing::warn!(
            event = %event.name,
            resource_type = %event.resource_type,
            "event stream rejected change event"
        );
    }
}

/// In-process callback fan-out stream.
#[derive(Default)]
pub struct LocalEventStream {
    callbacks: Vec<Box<dyn Fn(&ChangeEvent) + Send + Sync>>,
}

impl LocalEventStream {
    /// Creates an empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback invoked for every published event.
    pub fn subscribe(&mut self, callback: impl Fn(&ChangeEvent) + Send + Sync + 'static) {
        self.callbacks.push(Box::new(callback));
    }
}

impl EventStream for LocalEventStream {
    fn publish(&self, event: &ChangeEvent) -> bool {
        for callback in &self.callbacks {
            callback(event);
        }
        true
    }
}
