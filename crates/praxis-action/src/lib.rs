//! Verb-driven resource actions for the Praxis resource framework.
//!
//! This crate turns a decoded request into an outcome. An action is a
//! [`Kind`] (create, read, search, copy, a relation variant, or a custom
//! name) run through one shared state machine ([`ResourceAction`]): the
//! verb is checked against the kind, declared parameters are loaded and
//! coerced, and the action either *performs* or, for a GET against a
//! mutating kind, *presents* the resource it would affect.
//!
//! # Example
//!
//! ```
//! use http::Method;
//! use praxis_action::{ActionContext, ActionRequest, Kind, ResourceAction, Target};
//! use praxis_core::fixtures;
//!
//! let store = fixtures::store_with_widgets(3);
//! let registry = fixtures::MemoryRegistry::with_fixtures();
//! let events = fixtures::RecordingEventStream::new();
//!
//! let request = ActionRequest::new(Method::GET, "widgets/read");
//! let target = Target::item("widgets", 1);
//! let ctx = ActionContext {
//!     store: &store,
//!     schemas: &registry,
//!     events: &events,
//!     cache: None,
//!     cache_ttl: None,
//!     custom: None,
//!     request: &request,
//!     target: &target,
//!     default_page_size: 20,
//! };
//!
//! let result = ResourceAction::new(Kind::Read).run(&ctx).unwrap();
//! assert_eq!(result.status, http::StatusCode::OK);
//! ```

mod action;
mod cache;
mod custom;
mod kind;
mod params;
mod request;

pub use action::{ActionContext, ActionState, ResourceAction};
pub use cache::{cache_key, ActionCache, MemoryActionCache};
pub use custom::{CustomActionFn, CustomActionRegistry};
pub use kind::Kind;
pub use params::{cast_value, load_params};
pub use request::{ActionRequest, Target};
