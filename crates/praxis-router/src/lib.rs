//! Path routing, media-type negotiation, and dispatch for the Praxis
//! resource framework.
//!
//! The host transport hands a [`Request`] to a [`Dispatcher`]; the
//! dispatcher resolves the path against the resource grammar, maps the
//! verb to an action, negotiates the output codec (extension, then
//! Accept order, then the configured default), runs the action, and
//! renders the outcome (or the error) through the envelope pipeline.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use http::Method;
//! use praxis_core::fixtures;
//! use praxis_router::{Dispatcher, Request};
//!
//! let registry = Arc::new(fixtures::MemoryRegistry::with_fixtures());
//! let store = Arc::new(fixtures::MemoryStore::new(Arc::clone(&registry)));
//! let events = Arc::new(fixtures::RecordingEventStream::new());
//! let dispatcher = Dispatcher::new(store, registry, events);
//!
//! let response = dispatcher
//!     .dispatch(&Request::new(Method::GET, "/widgets"))
//!     .unwrap();
//! assert_eq!(response.status, http::StatusCode::OK);
//! ```

mod config;
mod dispatch;
mod path;
mod request;

pub use config::DispatcherConfig;
pub use dispatch::Dispatcher;
pub use path::{camel_case, parse_path, RoutedPath};
pub use request::{Request, Response};
