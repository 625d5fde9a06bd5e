//! HTML codec (render-only, delegating to a collaborator).

use bytes::Bytes;
use praxis_core::Value;

use crate::{FormatContext, MediaTypeCodec, ParseContext};

/// Renders a payload to HTML.
///
/// The framework has no view layer; hosts that want HTML output supply an
/// implementation of this trait (a template engine binding, usually) when
/// installing the codec via
/// [`CodecRegistry::with_html`](crate::CodecRegistry::with_html).
pub trait HtmlRenderer: Send + Sync {
    /// Renders the payload to an HTML document or fragment.
    fn render(&self, ctx: &FormatContext<'_>) -> String;
}

/// The HTML codec. Never parses; formatting defers entirely to the
/// injected [`HtmlRenderer`].
pub struct HtmlCodec {
    renderer: Box<dyn HtmlRenderer>,
}

impl HtmlCodec {
    /// Creates the HTML codec around a renderer.
    #[must_use]
    pub fn new(renderer: impl HtmlRenderer + 'static) -> Self {
        Self {
            renderer: Box::new(renderer),
        }
    }
}

impl MediaTypeCodec for HtmlCodec {
    fn file_extensions(&self) -> &[&str] {
        &["html"]
    }

    fn mime_types(&self) -> &[&str] {
        &["text/html", "application/xhtml+xml"]
    }

    fn can_parse(&self, _content_type: Option<&str>) -> bool {
        false
    }

    fn parse(&self, _ctx: &ParseContext<'_>) -> Option<Value> {
        None
    }

    fn format(&self, ctx: &FormatContext<'_>) -> Bytes {
        Bytes::from(self.renderer.render(ctx))
    }
}
