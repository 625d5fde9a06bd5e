//! The codec contract and registry.

use bytes::Bytes;
use http::Method;
use praxis_core::{AttributeMap, Payload, ResourceDescriptor, Value};

use crate::accept::MediaRange;
use crate::{DelimitedCodec, FormCodec, HtmlRenderer, JsonCodec, JsonpCodec, MarkdownCodec, XmlCodec};

/// Everything a codec may consult while parsing a request body.
pub struct ParseContext<'a> {
    /// The request method.
    pub method: &'a Method,
    /// The request content type, if any.
    pub content_type: Option<&'a str>,
    /// The raw request body.
    pub body: &'a [u8],
}

/// Everything a codec may consult while formatting a response.
pub struct FormatContext<'a> {
    /// The payload to render.
    pub payload: &'a Payload,
    /// The schema descriptor for the payload's resource type, when known.
    /// Codecs that need labels (Markdown, CSV headers) fall back to raw
    /// attribute names without it.
    pub descriptor: Option<&'a ResourceDescriptor>,
    /// The merged request parameters (query plus route).
    pub params: &'a AttributeMap,
    /// Whether to pretty-print, for formats that support it.
    pub pretty: bool,
}

/// A pluggable parser and formatter for one media type.
///
/// Parsing is lenient: malformed or empty bodies yield `None`, never an
/// error, and the caller treats `None` as "no input supplied". Formatting
/// always produces bytes; tabular formats flatten the envelope lossily.
pub trait MediaTypeCodec: Send + Sync {
    /// The file extensions this codec answers to. The first one is the
    /// canonical name used for configuration defaults.
    fn file_extensions(&self) -> &[&str];

    /// The mime types this codec accepts and emits. The first one is used
    /// as the response content type.
    fn mime_types(&self) -> &[&str];

    /// The `Content-Type` to set on responses formatted by this codec.
    fn content_type(&self) -> &str {
        self.mime_types().first().copied().unwrap_or("application/octet-stream")
    }

    /// Returns `true` if this codec can parse a body with the given
    /// content type.
    fn can_parse(&self, content_type: Option<&str>) -> bool {
        content_type.is_some_and(|ct| {
            let bare = ct.split(';').next().unwrap_or(ct).trim();
            self.mime_types()
                .iter()
                .any(|mime| mime.eq_ignore_ascii_case(bare))
        })
    }

    /// Returns `true` if this codec can format a response for the given
    /// preferred media ranges or explicit file extension.
    fn can_format(&self, accept: &[MediaRange], extension: Option<&str>) -> bool {
        if extension.is_some_and(|ext| self.matches_extension(ext)) {
            return true;
        }
        accept.iter().any(|range| {
            self.mime_types().iter().any(|mime| range.matches(mime))
        })
    }

    /// Returns `true` if the given file extension names this codec.
    fn matches_extension(&self, extension: &str) -> bool {
        self.file_extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }

    /// Parses a request body into an attribute value, or `None` when the
    /// body is empty or unparseable.
    fn parse(&self, ctx: &ParseContext<'_>) -> Option<Value>;

    /// Formats a payload into response bytes.
    fn format(&self, ctx: &FormatContext<'_>) -> Bytes;
}

/// The set of installed codecs, in registration order.
pub struct CodecRegistry {
    codecs: Vec<Box<dyn MediaTypeCodec>>,
}

impl CodecRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { codecs: Vec::new() }
    }

    /// Creates a registry with every built-in codec except HTML, which
    /// needs a renderer collaborator (see [`Self::with_html`]).
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(JsonCodec::new());
        registry.register(XmlCodec::new());
        registry.register(DelimitedCodec::csv());
        registry.register(DelimitedCodec::tsv());
        registry.register(FormCodec::new());
        registry.register(MarkdownCodec::new());
        registry.register(JsonpCodec::new());
        registry
    }

    /// Adds a codec. Later registrations lose ties against earlier ones.
    pub fn register(&mut self, codec: impl MediaTypeCodec + 'static) {
        self.codecs.push(Box::new(codec));
    }

    /// Installs the HTML codec with the given renderer.
    pub fn with_html(mut self, renderer: impl HtmlRenderer + 'static) -> Self {
        self.register(crate::HtmlCodec::new(renderer));
        self
    }

    /// Returns the codec registered for a file extension.
    #[must_use]
    pub fn by_extension(&self, extension: &str) -> Option<&dyn MediaTypeCodec> {
        self.codecs
            .iter()
            .find(|codec| codec.matches_extension(extension))
            .map(AsRef::as_ref)
    }

    /// Selects the output codec for a request.
    ///
    /// Precedence: explicit file extension, then the client's preferred
    /// media ranges in order, then the configured default extension.
    #[must_use]
    pub fn negotiate_output(
        &self,
        accept: &[MediaRange],
        extension: Option<&str>,
        default: &str,
    ) -> Option<&dyn MediaTypeCodec> {
        if let Some(ext) = extension {
            if let Some(codec) = self.by_extension(ext) {
                return Some(codec);
            }
        }
        for range in accept {
            let found = self.codecs.iter().find(|codec| {
                codec
                    .mime_types()
                    .iter()
                    .any(|mime| range.matches(mime))
            });
            if let Some(codec) = found {
                return Some(codec.as_ref());
            }
        }
        self.by_extension(default)
    }

    /// Selects the input codec for a request body, falling back to the
    /// configured default extension when no content type matches.
    #[must_use]
    pub fn negotiate_input(
        &self,
        content_type: Option<&str>,
        default: &str,
    ) -> Option<&dyn MediaTypeCodec> {
        self.codecs
            .iter()
            .find(|codec| codec.can_parse(content_type))
            .map(AsRef::as_ref)
            .or_else(|| self.by_extension(default))
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_accept;

    #[test]
    fn test_extension_beats_accept() {
        let registry = CodecRegistry::with_defaults();
        let accept = parse_accept("application/json");
        let codec = registry
            .negotiate_output(&accept, Some("csv"), "json")
            .unwrap();
        assert_eq!(codec.content_type(), "text/csv");
    }

    #[test]
    fn test_accept_order_wins_without_extension() {
        let registry = CodecRegistry::with_defaults();
        let accept = parse_accept("text/tsv, application/json;q=0.9");
        let codec = registry.negotiate_output(&accept, None, "json").unwrap();
        assert_eq!(codec.content_type(), "text/tsv");
    }

    #[test]
    fn test_hal_json_alias_selects_json() {
        let registry = CodecRegistry::with_defaults();
        let accept = parse_accept("application/hal+json");
        let codec = registry.negotiate_output(&accept, None, "form").unwrap();
        assert_eq!(codec.content_type(), "application/json");
    }

    #[test]
    fn test_default_applies_when_nothing_matches() {
        let registry = CodecRegistry::with_defaults();
        let accept = parse_accept("*/*");
        let codec = registry.negotiate_output(&accept, None, "json").unwrap();
        assert_eq!(codec.content_type(), "application/json");
    }

    #[test]
    fn test_unknown_extension_falls_through_to_accept() {
        let registry = CodecRegistry::with_defaults();
        let accept = parse_accept("application/xml");
        let codec = registry
            .negotiate_output(&accept, Some("zip"), "json")
            .unwrap();
        assert_eq!(codec.content_type(), "application/xml");
    }

    #[test]
    fn test_input_negotiation_by_content_type() {
        let registry = CodecRegistry::with_defaults();
        let codec = registry
            .negotiate_input(Some("application/x-www-form-urlencoded"), "form")
            .unwrap();
        assert_eq!(codec.file_extensions()[0], "form");

        let codec = registry
            .negotiate_input(Some("application/json; charset=utf-8"), "form")
            .unwrap();
        assert_eq!(codec.file_extensions()[0], "json");
    }
}
