//! Host-registered custom actions.
//!
//! Any route action name outside the built-in set dispatches through a
//! [`CustomActionRegistry`]. A custom action is a callback receiving the
//! action context, the decoded input, and the loaded resource when the
//! target is an item; it returns an [`ActionResult`] like any built-in.

use std::collections::HashMap;

use praxis_core::{ActionResult, AttributeMap, Resource, RestResult};

use crate::action::ActionContext;

/// The callback signature for custom actions.
pub type CustomActionFn = dyn Fn(
        &ActionContext<'_>,
        Option<&AttributeMap>,
        Option<Box<dyn Resource>>,
    ) -> RestResult<ActionResult>
    + Send
    + Sync;

/// A name-to-callback table of custom actions.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use praxis_action::CustomActionRegistry;
/// use praxis_core::{ActionResult, Payload};
///
/// let mut registry = CustomActionRegistry::new();
/// registry.register("publish", |_ctx, _input, _loaded| {
///     Ok(ActionResult::new(StatusCode::ACCEPTED, Payload::Empty))
/// });
/// assert!(registry.get("publish").is_some());
/// ```
#[derive(Default)]
pub struct CustomActionRegistry {
    actions: HashMap<String, Box<CustomActionFn>>,
}

impl CustomActionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a custom action under the given route name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        action: impl Fn(
                &ActionContext<'_>,
                Option<&AttributeMap>,
                Option<Box<dyn Resource>>,
            ) -> RestResult<ActionResult>
            + Send
            + Sync
            + 'static,
    ) {
        self.actions.insert(name.into(), Box::new(action));
    }

    /// Looks up a custom action by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CustomActionFn> {
        self.actions.get(name).map(Box::as_ref)
    }

    /// Returns the number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` when no actions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
