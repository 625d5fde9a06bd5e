//! Markdown codec (render-only).

use bytes::Bytes;
use praxis_core::{envelope, Payload, Resource, ResourceDescriptor, Value};

use crate::{FormatContext, MediaTypeCodec, ParseContext};

/// Renders payloads as human-readable Markdown. Never parses.
///
/// A resource renders as a heading plus one `__Label__ \`value\`` line per
/// non-empty attribute; a collection renders its label, a count line, and
/// each item separated by a rule.
#[derive(Debug, Default)]
pub struct MarkdownCodec;

impl MarkdownCodec {
    /// Creates the Markdown codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn render_resource(
        out: &mut String,
        resource: &dyn Resource,
        descriptor: Option<&ResourceDescriptor>,
    ) {
        let label = descriptor.map_or_else(|| resource.type_name().to_string(), |d| d.label.clone());
        let name = resource
            .instance_label()
            .or_else(|| resource.primary_key().map(|pk| envelope::pk_string(&pk)))
            .unwrap_or_default();
        out.push_str(&format!("# {label}: {name}\n\n"));

        let attributes = resource.attributes();
        for attribute in resource.visible_attribute_names() {
            let Some(value) = attributes.get(&attribute) else {
                continue;
            };
            if value.is_null() || value.as_str().is_some_and(str::is_empty) {
                continue;
            }
            let attribute_label = descriptor
                .and_then(|d| d.attributes.get(&attribute))
                .map_or_else(|| attribute.clone(), |a| a.label.clone());
            out.push_str(&format!("__{attribute_label}__ `{}`\n\n", scalar(value)));
        }
        out.push_str("---\n");
    }
}

impl MediaTypeCodec for MarkdownCodec {
    fn file_extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn mime_types(&self) -> &[&str] {
        &["text/markdown", "text/plain"]
    }

    fn can_parse(&self, _content_type: Option<&str>) -> bool {
        false
    }

    fn parse(&self, _ctx: &ParseContext<'_>) -> Option<Value> {
        None
    }

    fn format(&self, ctx: &FormatContext<'_>) -> Bytes {
        let mut out = String::new();
        match ctx.payload {
            Payload::Resource(resource) => {
                Self::render_resource(&mut out, resource.as_ref(), ctx.descriptor);
            }
            Payload::Collection(collection) => {
                out.push_str(&format!("# {}\n\n", collection.label));
                let count_line = match collection.total {
                    0 => format!("There are no {}.\n\n", collection.label),
                    1 => "There is one item.\n\n".to_string(),
                    n => format!("There are {n} {}.\n\n", collection.label),
                };
                out.push_str(&count_line);
                for item in &collection.items {
                    Self::render_resource(&mut out, item.as_ref(), ctx.descriptor);
                }
            }
            Payload::Data(value) => {
                let rendered = serde_json::to_string_pretty(value).unwrap_or_default();
                out.push_str(&format!("```json\n{rendered}\n```\n"));
            }
            Payload::Empty => {}
        }
        Bytes::from(out)
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_core::fixtures::{widget, widget_descriptor};
    use praxis_core::AttributeMap;

    fn format(payload: &Payload) -> String {
        let descriptor = widget_descriptor();
        let params = AttributeMap::new();
        let ctx = FormatContext {
            payload,
            descriptor: Some(&descriptor),
            params: &params,
            pretty: false,
        };
        String::from_utf8(MarkdownCodec::new().format(&ctx).to_vec()).unwrap()
    }

    #[test]
    fn test_resource_heading_and_attribute_lines() {
        let payload = Payload::Resource(Box::new(widget(1, "gear", "blue")));
        let out = format(&payload);
        assert!(out.starts_with("# Widget: gear\n"));
        assert!(out.contains("__Name__ `gear`"));
        assert!(out.contains("__Color__ `blue`"));
    }

    #[test]
    fn test_never_parses() {
        assert!(!MarkdownCodec::new().can_parse(Some("text/markdown")));
    }
}
