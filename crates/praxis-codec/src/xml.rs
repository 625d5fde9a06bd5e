//! XML codec.
//!
//! The writer and reader here are deliberately small: the envelope only
//! needs elements and text, so there is no attribute or namespace
//! handling. Values always parse back as strings; typed round-trips are a
//! JSON property, not an XML one.

use bytes::Bytes;
use praxis_core::{envelope, Value};
use serde_json::Map;

use crate::{FormatContext, MediaTypeCodec, ParseContext};

/// Parses and formats XML, including the HAL alias types.
///
/// Formatting wraps the envelope in a `<resource>` root element; array
/// entries become `<item>` elements. Parsing is lenient and collapses
/// single-child elements, mirroring the write side.
pub struct XmlCodec {
    /// The root element name.
    pub container_name: String,
    /// The element name for array entries.
    pub item_name: String,
}

impl XmlCodec {
    /// Creates the XML codec with `resource`/`item` element names.
    #[must_use]
    pub fn new() -> Self {
        Self {
            container_name: "resource".to_string(),
            item_name: "item".to_string(),
        }
    }
}

impl Default for XmlCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaTypeCodec for XmlCodec {
    fn file_extensions(&self) -> &[&str] {
        &["xml"]
    }

    fn mime_types(&self) -> &[&str] {
        &["application/xml", "application/hal+xml", "text/xml"]
    }

    fn parse(&self, ctx: &ParseContext<'_>) -> Option<Value> {
        if ctx.body.is_empty() {
            return None;
        }
        let Ok(text) = std::str::from_utf8(ctx.body) else {
            return None;
        };
        match read_document(text) {
            Some(value) => Some(value),
            None => {
                tracing::debug!("ignoring malformed XML body");
                None
            }
        }
    }

    fn format(&self, ctx: &FormatContext<'_>) -> Bytes {
        let value = envelope::payload_value(ctx.payload);
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>");
        write_element(&mut out, &self.container_name, &value, &self.item_name);
        Bytes::from(out)
    }
}

fn write_element(out: &mut String, name: &str, value: &Value, item_name: &str) {
    let name = sanitize_name(name);
    out.push('<');
    out.push_str(&name);
    out.push('>');
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                write_element(out, key, child, item_name);
            }
        }
        Value::Array(items) => {
            for child in items {
                write_element(out, item_name, child, item_name);
            }
        }
        Value::Null => {}
        Value::String(s) => out.push_str(&escape_text(s)),
        other => out.push_str(&other.to_string()),
    }
    out.push_str("</");
    out.push_str(&name);
    out.push('>');
}

/// Replaces characters that cannot appear in an element name and makes
/// sure the name does not start with a digit or punctuation.
fn sanitize_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || ch == '.' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() || out.starts_with(|ch: char| ch.is_ascii_digit() || ch == '-' || ch == '.') {
        out.insert(0, '_');
    }
    out
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape_text(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Parses a document and returns the root element's value.
fn read_document(text: &str) -> Option<Value> {
    let mut reader = Reader { text, pos: 0 };
    reader.skip_prolog();
    let (_, value) = reader.read_element()?;
    Some(value)
}

struct Reader<'a> {
    text: &'a str,
    pos: usize,
}

impl Reader<'_> {
    fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn skip_prolog(&mut self) {
        loop {
            self.skip_whitespace();
            if self.rest().starts_with("<?") {
                match self.rest().find("?>") {
                    Some(end) => self.pos += end + 2,
                    None => return,
                }
            } else if self.rest().starts_with("<!--") {
                match self.rest().find("-->") {
                    Some(end) => self.pos += end + 3,
                    None => return,
                }
            } else {
                return;
            }
        }
    }

    /// Reads `<name ...>children</name>` or `<name ... />` at the cursor.
    fn read_element(&mut self) -> Option<(String, Value)> {
        self.skip_whitespace();
        if !self.rest().starts_with('<') {
            return None;
        }
        self.pos += 1;
        let name_len = self
            .rest()
            .find(|ch: char| ch.is_whitespace() || ch == '>' || ch == '/')?;
        let name = self.rest()[..name_len].to_string();
        if name.is_empty() {
            return None;
        }
        self.pos += name_len;

        // Skip attributes up to the tag close.
        let close = self.rest().find('>')?;
        let self_closing = self.rest()[..close].ends_with('/');
        self.pos += close + 1;
        if self_closing {
            return Some((name, Value::Null));
        }

        let mut children: Map<String, Value> = Map::new();
        let mut text = String::new();
        loop {
            self.skip_prolog();
            if self.rest().starts_with("</") {
                let end = self.rest().find('>')?;
                self.pos += end + 1;
                break;
            }
            if self.rest().starts_with('<') {
                let (child_name, child_value) = self.read_element()?;
                append_child(&mut children, child_name, child_value);
            } else {
                let end = self.rest().find('<')?;
                text.push_str(&self.rest()[..end]);
                self.pos += end;
            }
        }

        if children.is_empty() {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Some((name, Value::Null));
            }
            return Some((name, Value::String(unescape_text(trimmed))));
        }
        Some((name, Value::Object(children)))
    }
}

/// Collects repeated child elements into arrays; single children stay
/// collapsed to their value.
fn append_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        None => {
            children.insert(name, value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use praxis_core::{AttributeMap, Payload};
    use serde_json::json;

    fn parse(body: &[u8]) -> Option<Value> {
        let method = Method::POST;
        let ctx = ParseContext {
            method: &method,
            content_type: Some("application/xml"),
            body,
        };
        XmlCodec::new().parse(&ctx)
    }

    fn format(payload: &Payload) -> String {
        let params = AttributeMap::new();
        let ctx = FormatContext {
            payload,
            descriptor: None,
            params: &params,
            pretty: false,
        };
        String::from_utf8(XmlCodec::new().format(&ctx).to_vec()).unwrap()
    }

    #[test]
    fn test_round_trip_scalar_attributes() {
        let payload = Payload::Data(json!({"name": "gear", "color": "blue"}));
        let rendered = format(&payload);
        let parsed = parse(rendered.as_bytes()).unwrap();
        assert_eq!(parsed, json!({"name": "gear", "color": "blue"}));
    }

    #[test]
    fn test_arrays_render_as_items() {
        let payload = Payload::Data(json!({"tags": ["a", "b"]}));
        let rendered = format(&payload);
        assert!(rendered.contains("<tags><item>a</item><item>b</item></tags>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let payload = Payload::Data(json!({"name": "a < b & c"}));
        let rendered = format(&payload);
        assert!(rendered.contains("a &lt; b &amp; c"));
        let parsed = parse(rendered.as_bytes()).unwrap();
        assert_eq!(parsed["name"], json!("a < b & c"));
    }

    #[test]
    fn test_malformed_body_is_none() {
        assert!(parse(b"<resource><unclosed></resource").is_none());
        assert!(parse(b"not xml at all").is_none());
        assert!(parse(b"").is_none());
    }

    #[test]
    fn test_repeated_children_become_array() {
        let parsed =
            parse(b"<resource><tag>a</tag><tag>b</tag></resource>").unwrap();
        assert_eq!(parsed["tag"], json!(["a", "b"]));
    }

    #[test]
    fn test_invalid_key_characters_are_sanitized() {
        let payload = Payload::Data(json!({"bad key!": 1}));
        let rendered = format(&payload);
        assert!(rendered.contains("<bad_key_>1</bad_key_>"));
    }
}
