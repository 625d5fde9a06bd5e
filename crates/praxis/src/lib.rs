//! # Praxis
//!
//! **Resource-oriented REST framework with HAL envelopes and pluggable
//! media types**
//!
//! Praxis turns a schema-described resource type into a full REST
//! surface:
//!
//! - **Uniform envelopes** – every response carries `_links`, embedded
//!   relations, and validation errors in one HAL-style shape
//! - **Verb-driven actions** – create, read, update, replace, delete,
//!   search, stats, copy, and relation traversal from a single state
//!   machine
//! - **Content negotiation** – path extension, then `Accept` order, then
//!   a configured default, across JSON, XML, CSV/TSV, form, Markdown,
//!   HTML, and JSONP codecs
//! - **Pluggable persistence** – bring your own store, schema registry,
//!   and change-event stream behind small traits
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use praxis::prelude::*;
//! use praxis_core::fixtures;
//!
//! let registry = Arc::new(fixtures::MemoryRegistry::with_fixtures());
//! let store = Arc::new(fixtures::MemoryStore::new(Arc::clone(&registry)));
//! let events = Arc::new(fixtures::RecordingEventStream::new());
//! let dispatcher = Dispatcher::new(store, registry, events);
//!
//! let response = dispatcher
//!     .dispatch(&Request::new(http::Method::GET, "/widgets"))
//!     .unwrap();
//! assert_eq!(response.status, http::StatusCode::OK);
//! ```
//!
//! ## Architecture
//!
//! A request flows through a fixed pipeline:
//!
//! ```text
//! Request → parse_path → verb map → ActionRequest → ResourceAction
//!                                                        ↓
//! Response ← codec.format ← negotiate_output ← ActionResult
//! ```
//!
//! Errors re-enter the pipeline at the negotiation step, so clients see
//! the same envelope and media type whether the action succeeded or not.

#![doc(html_root_url = "https://docs.rs/praxis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use praxis_core as core;

// Re-export media type codecs
pub use praxis_codec as codec;

// Re-export the action state machine
pub use praxis_action as action;

// Re-export routing and dispatch
pub use praxis_router as router;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use praxis::prelude::*;
/// ```
pub mod prelude {
    pub use praxis_core::{
        ActionResult, AttributeMap, Collection, Criteria, EventStream, Payload, Resource,
        ResourceDescriptor, ResourceStore, RestError, RestResult, SchemaRegistry, Value,
    };

    // Re-export negotiation types
    pub use praxis_codec::{parse_accept, CodecRegistry, MediaTypeCodec};

    // Re-export the action surface
    pub use praxis_action::{
        ActionCache, ActionContext, ActionRequest, CustomActionRegistry, Kind, ResourceAction,
        Target,
    };

    // Re-export the dispatch surface
    pub use praxis_router::{Dispatcher, DispatcherConfig, Request, Response};
}
