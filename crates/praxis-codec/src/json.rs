//! JSON codec.

use bytes::Bytes;
use praxis_core::envelope;

use crate::{FormatContext, MediaTypeCodec, ParseContext};

/// Parses and formats JSON, including the HAL alias types.
///
/// Parsing is lenient: empty or malformed bodies yield `None`. This is a
/// deliberate policy favoring partial-input flows over strict validation;
/// a client that sends garbage gets the same treatment as one that sends
/// nothing.
///
/// # Example
///
/// ```
/// use praxis_codec::{JsonCodec, MediaTypeCodec, ParseContext};
/// use http::Method;
///
/// let codec = JsonCodec::new();
/// let ctx = ParseContext {
///     method: &Method::POST,
///     content_type: Some("application/json"),
///     body: br#"{"name": "sprocket"}"#,
/// };
/// let value = codec.parse(&ctx).unwrap();
/// assert_eq!(value["name"], "sprocket");
/// ```
#[derive(Debug, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Creates the JSON codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MediaTypeCodec for JsonCodec {
    fn file_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn mime_types(&self) -> &[&str] {
        &["application/json", "application/hal+json", "text/json"]
    }

    fn parse(&self, ctx: &ParseContext<'_>) -> Option<praxis_core::Value> {
        if ctx.body.is_empty() {
            return None;
        }
        match serde_json::from_slice(ctx.body) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::debug!(%error, "ignoring malformed JSON body");
                None
            }
        }
    }

    fn format(&self, ctx: &FormatContext<'_>) -> Bytes {
        let value = envelope::payload_value(ctx.payload);
        let rendered = if ctx.pretty {
            serde_json::to_vec_pretty(&value)
        } else {
            serde_json::to_vec(&value)
        };
        Bytes::from(rendered.unwrap_or_default())
    }
}
