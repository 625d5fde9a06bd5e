//! JSONP codec (format-only).

use bytes::Bytes;
use praxis_core::envelope;

use crate::{FormatContext, MediaTypeCodec, ParseContext};

/// Formats responses as a JavaScript callback invocation.
///
/// JSONP is never an acceptable input format (script injection risk), so
/// `can_parse` is always `false` and `parse` always yields `None`. The
/// callback name comes from the `jsonp` or `callback` request parameter
/// when custom callbacks are allowed, falling back to the configured
/// default.
pub struct JsonpCodec {
    /// Whether the `jsonp`/`callback` request parameters may override the
    /// callback name.
    pub allow_custom_callback: bool,
    /// The default callback name.
    pub callback_name: String,
}

impl JsonpCodec {
    /// Creates the JSONP codec with the `callback` default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allow_custom_callback: true,
            callback_name: "callback".to_string(),
        }
    }

    fn request_callback(&self, ctx: &FormatContext<'_>) -> String {
        if self.allow_custom_callback {
            for name in ["jsonp", "callback"] {
                if let Some(value) = ctx.params.get(name).and_then(|v| v.as_str()) {
                    if !value.is_empty() {
                        return value.to_string();
                    }
                }
            }
        }
        self.callback_name.clone()
    }
}

impl Default for JsonpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaTypeCodec for JsonpCodec {
    fn file_extensions(&self) -> &[&str] {
        &["jsonp"]
    }

    fn mime_types(&self) -> &[&str] {
        &["text/javascript"]
    }

    fn can_parse(&self, _content_type: Option<&str>) -> bool {
        false
    }

    fn parse(&self, _ctx: &ParseContext<'_>) -> Option<praxis_core::Value> {
        None
    }

    fn format(&self, ctx: &FormatContext<'_>) -> Bytes {
        let value = envelope::payload_value(ctx.payload);
        let rendered = if ctx.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        let body = rendered.unwrap_or_default();
        let callback = self.request_callback(ctx);
        Bytes::from(format!("{callback}({body})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_core::{AttributeMap, Payload};
    use serde_json::json;

    fn format_with(params: AttributeMap) -> String {
        let payload = Payload::Data(json!({"ok": true}));
        let ctx = FormatContext {
            payload: &payload,
            descriptor: None,
            params: &params,
            pretty: false,
        };
        String::from_utf8(JsonpCodec::new().format(&ctx).to_vec()).unwrap()
    }

    #[test]
    fn test_default_callback() {
        assert_eq!(format_with(AttributeMap::new()), r#"callback({"ok":true})"#);
    }

    #[test]
    fn test_custom_callback_from_params() {
        let mut params = AttributeMap::new();
        params.insert("jsonp".to_string(), json!("handleIt"));
        assert_eq!(format_with(params), r#"handleIt({"ok":true})"#);
    }

    #[test]
    fn test_custom_callback_can_be_disabled() {
        let mut params = AttributeMap::new();
        params.insert("callback".to_string(), json!("evil"));
        let payload = Payload::Data(json!(1));
        let codec = JsonpCodec {
            allow_custom_callback: false,
            callback_name: "cb".to_string(),
        };
        let ctx = FormatContext {
            payload: &payload,
            descriptor: None,
            params: &params,
            pretty: false,
        };
        let out = String::from_utf8(codec.format(&ctx).to_vec()).unwrap();
        assert_eq!(out, "cb(1)");
    }

    #[test]
    fn test_never_parses() {
        assert!(!JsonpCodec::new().can_parse(Some("text/javascript")));
    }
}
