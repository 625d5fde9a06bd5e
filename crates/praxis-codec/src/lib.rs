//! # Praxis Codec
//!
//! Media type codecs and content negotiation for the Praxis resource
//! framework.
//!
//! A [`MediaTypeCodec`] owns one wire format: it decides whether it can
//! parse a request body (by content type) or format a response (by file
//! extension or `Accept` header), turns raw bytes into an attribute value,
//! and renders an action payload into bytes. The [`CodecRegistry`] holds
//! the installed codecs and performs negotiation with the precedence
//! *extension > Accept order > configured default*.
//!
//! ## Supported formats
//!
//! | Codec | Extensions | Parses | Formats |
//! |-------|-----------|--------|---------|
//! | [`JsonCodec`] | `json` | yes | yes |
//! | [`XmlCodec`] | `xml` | yes | yes |
//! | [`DelimitedCodec`] (CSV) | `csv` | yes | yes (flattened) |
//! | [`DelimitedCodec`] (TSV) | `tsv` | yes | yes (flattened) |
//! | [`FormCodec`] | `form` | yes | yes (flattened) |
//! | [`MarkdownCodec`] | `md`, `markdown` | no | yes |
//! | [`HtmlCodec`] | `html` | no | via [`HtmlRenderer`] |
//! | [`JsonpCodec`] | `jsonp` | no | yes |
//!
//! ## Example
//!
//! ```
//! use praxis_codec::{parse_accept, CodecRegistry};
//!
//! let registry = CodecRegistry::with_defaults();
//! let accept = parse_accept("application/hal+json, text/csv;q=0.5");
//!
//! // Accept order picks JSON; an explicit .csv extension would win instead.
//! let codec = registry.negotiate_output(&accept, None, "json").unwrap();
//! assert_eq!(codec.file_extensions()[0], "json");
//!
//! let codec = registry.negotiate_output(&accept, Some("csv"), "json").unwrap();
//! assert_eq!(codec.file_extensions()[0], "csv");
//! ```

mod accept;
mod codec;
mod delimited;
mod form;
mod html;
mod json;
mod jsonp;
mod markdown;
mod xml;

pub use accept::{parse_accept, MediaRange};
pub use codec::{CodecRegistry, FormatContext, MediaTypeCodec, ParseContext};
pub use delimited::DelimitedCodec;
pub use form::FormCodec;
pub use html::{HtmlCodec, HtmlRenderer};
pub use json::JsonCodec;
pub use jsonp::JsonpCodec;
pub use markdown::MarkdownCodec;
pub use xml::XmlCodec;
