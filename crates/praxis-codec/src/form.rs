//! URL-encoded form codec.

use bytes::Bytes;
use http::Method;
use praxis_core::{envelope, Value};
use serde_json::Map;

use crate::{FormatContext, MediaTypeCodec, ParseContext};

/// Parses and formats `application/x-www-form-urlencoded` bodies.
///
/// Parsing only applies to methods that carry form bodies (POST, PUT,
/// PATCH); a GET with a form content type yields `None`. Formatting is a
/// lossy flatten of the envelope: top-level scalars become pairs and
/// nested values are JSON-encoded strings.
#[derive(Debug, Default)]
pub struct FormCodec;

impl FormCodec {
    /// Creates the form codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MediaTypeCodec for FormCodec {
    fn file_extensions(&self) -> &[&str] {
        &["form"]
    }

    fn mime_types(&self) -> &[&str] {
        &["application/x-www-form-urlencoded", "multipart/form-data"]
    }

    fn parse(&self, ctx: &ParseContext<'_>) -> Option<Value> {
        if !matches!(*ctx.method, Method::POST | Method::PUT | Method::PATCH) {
            return None;
        }
        if ctx.body.is_empty() {
            return None;
        }
        match serde_urlencoded::from_bytes::<Vec<(String, String)>>(ctx.body) {
            Ok(pairs) if pairs.is_empty() => None,
            Ok(pairs) => {
                let mut map = Map::new();
                for (name, value) in pairs {
                    map.insert(name, Value::String(value));
                }
                Some(Value::Object(map))
            }
            Err(error) => {
                tracing::debug!(%error, "ignoring malformed form body");
                None
            }
        }
    }

    fn format(&self, ctx: &FormatContext<'_>) -> Bytes {
        let value = envelope::payload_value(ctx.payload);
        let pairs: Vec<(String, String)> = match value {
            Value::Object(map) => map
                .into_iter()
                .map(|(name, value)| (name, flat(&value)))
                .collect(),
            Value::Null => Vec::new(),
            other => vec![("value".to_string(), flat(&other))],
        };
        Bytes::from(serde_urlencoded::to_string(&pairs).unwrap_or_default())
    }
}

fn flat(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_core::{AttributeMap, Payload};
    use serde_json::json;

    fn parse(method: Method, body: &[u8]) -> Option<Value> {
        let ctx = ParseContext {
            method: &method,
            content_type: Some("application/x-www-form-urlencoded"),
            body,
        };
        FormCodec::new().parse(&ctx)
    }

    #[test]
    fn test_post_body_parses_to_strings() {
        let parsed = parse(Method::POST, b"name=gear&color=blue").unwrap();
        assert_eq!(parsed, json!({"name": "gear", "color": "blue"}));
    }

    #[test]
    fn test_get_never_parses() {
        assert!(parse(Method::GET, b"name=gear").is_none());
    }

    #[test]
    fn test_empty_body_is_none() {
        assert!(parse(Method::PUT, b"").is_none());
    }

    #[test]
    fn test_format_flattens_scalars() {
        let payload = Payload::Data(json!({"name": "a b", "count": 2}));
        let params = AttributeMap::new();
        let ctx = FormatContext {
            payload: &payload,
            descriptor: None,
            params: &params,
            pretty: false,
        };
        let out = String::from_utf8(FormCodec::new().format(&ctx).to_vec()).unwrap();
        assert_eq!(out, "name=a+b&count=2");
    }

    #[test]
    fn test_percent_decoding() {
        let parsed = parse(Method::POST, b"name=a%26b").unwrap();
        assert_eq!(parsed["name"], json!("a&b"));
    }
}
