//! CSV and TSV codecs.
//!
//! Tabular formats flatten the envelope lossily by design: collections
//! become header-plus-rows, a single resource becomes a two-line table,
//! and links/pagination are dropped. Parsing keeps a long-standing quirk:
//! a body with exactly one data row collapses to a single object instead
//! of a one-element list.

use bytes::Bytes;
use praxis_core::{Payload, Resource, Value};
use serde_json::Map;

use crate::{FormatContext, MediaTypeCodec, ParseContext};

/// A delimiter-separated-values codec; see [`DelimitedCodec::csv`] and
/// [`DelimitedCodec::tsv`].
pub struct DelimitedCodec {
    delimiter: u8,
    extensions: &'static [&'static str],
    mime_types: &'static [&'static str],
}

impl DelimitedCodec {
    /// Creates the comma-separated codec (`text/csv`).
    #[must_use]
    pub fn csv() -> Self {
        Self {
            delimiter: b',',
            extensions: &["csv"],
            mime_types: &["text/csv"],
        }
    }

    /// Creates the tab-separated codec (`text/tsv`).
    #[must_use]
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            extensions: &["tsv"],
            mime_types: &["text/tsv"],
        }
    }

    fn writer(&self) -> csv::Writer<Vec<u8>> {
        csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new())
    }

    fn resource_rows(resource: &dyn Resource) -> (Vec<String>, Vec<String>) {
        let attributes = resource.attributes();
        let mut names = resource.visible_attribute_names();
        let mut row: Vec<String> = names
            .iter()
            .map(|name| cell(attributes.get(name).unwrap_or(&Value::Null)))
            .collect();
        // Validation errors travel as extra columns, one per attribute.
        let errors = resource.errors();
        for (attribute, messages) in &errors.fields {
            names.push(format!("{attribute}_ERRORS"));
            row.push(messages.join(" and "));
        }
        (names, row)
    }
}

impl MediaTypeCodec for DelimitedCodec {
    fn file_extensions(&self) -> &[&str] {
        self.extensions
    }

    fn mime_types(&self) -> &[&str] {
        self.mime_types
    }

    fn parse(&self, ctx: &ParseContext<'_>) -> Option<Value> {
        if ctx.body.is_empty() {
            return None;
        }
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(ctx.body);

        let mut names: Option<Vec<String>> = None;
        let mut rows: Vec<Value> = Vec::new();
        for record in reader.records() {
            let Ok(record) = record else {
                tracing::debug!("ignoring malformed delimited body");
                return None;
            };
            match &names {
                None => {
                    names = Some(record.iter().map(ToString::to_string).collect());
                }
                Some(names) => {
                    // Short rows truncate at the shorter of header and row.
                    let mut item = Map::new();
                    for (name, value) in names.iter().zip(record.iter()) {
                        item.insert(name.clone(), Value::String(value.to_string()));
                    }
                    rows.push(Value::Object(item));
                }
            }
        }

        match rows.len() {
            0 => None,
            // Single-row bodies collapse to one object, not a list.
            1 => rows.pop(),
            _ => Some(Value::Array(rows)),
        }
    }

    fn format(&self, ctx: &FormatContext<'_>) -> Bytes {
        let mut writer = self.writer();
        let result = match ctx.payload {
            Payload::Collection(collection) => {
                let names = ctx.descriptor.map_or_else(
                    || {
                        collection
                            .items
                            .first()
                            .map(|item| item.visible_attribute_names())
                            .unwrap_or_default()
                    },
                    praxis_core::ResourceDescriptor::visible_attribute_names,
                );
                let mut result = writer.write_record(&names);
                for item in &collection.items {
                    if result.is_err() {
                        break;
                    }
                    let attributes = item.attributes();
                    let row: Vec<String> = names
                        .iter()
                        .map(|name| cell(attributes.get(name).unwrap_or(&Value::Null)))
                        .collect();
                    result = writer.write_record(&row);
                }
                result
            }
            Payload::Resource(resource) => {
                let (names, row) = Self::resource_rows(resource.as_ref());
                writer
                    .write_record(&names)
                    .and_then(|()| writer.write_record(&row))
            }
            Payload::Data(Value::Object(map)) => {
                let names: Vec<&String> = map.keys().collect();
                let row: Vec<String> = map.values().map(cell).collect();
                writer
                    .write_record(&names)
                    .and_then(|()| writer.write_record(&row))
            }
            Payload::Data(other) => writer.write_record([cell(other)]),
            Payload::Empty => Ok(()),
        };
        if let Err(error) = result {
            tracing::debug!(%error, "delimited formatting failed");
        }
        Bytes::from(writer.into_inner().unwrap_or_default())
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use praxis_core::fixtures::{widget, widget_descriptor};
    use praxis_core::{AttributeMap, Collection};
    use serde_json::json;

    fn parse(codec: &DelimitedCodec, body: &[u8]) -> Option<Value> {
        let method = Method::POST;
        let ctx = ParseContext {
            method: &method,
            content_type: Some("text/csv"),
            body,
        };
        codec.parse(&ctx)
    }

    fn collection_of(items: Vec<praxis_core::fixtures::MemoryResource>) -> Collection {
        Collection {
            resource_type: "widgets".to_string(),
            container_name: "widgets".to_string(),
            label: "Widgets".to_string(),
            items: items
                .into_iter()
                .map(|w| Box::new(w) as Box<dyn Resource>)
                .collect(),
            total: 1,
            limit: Some(10),
            current_page: 0,
            params: AttributeMap::new(),
            base_path: "/widgets".to_string(),
        }
    }

    #[test]
    fn test_single_row_collection_formats_two_lines() {
        let descriptor = widget_descriptor();
        let payload = Payload::Collection(collection_of(vec![widget(1, "gear", "blue")]));
        let params = AttributeMap::new();
        let ctx = FormatContext {
            payload: &payload,
            descriptor: Some(&descriptor),
            params: &params,
            pretty: false,
        };
        let out = String::from_utf8(DelimitedCodec::csv().format(&ctx).to_vec()).unwrap();
        let lines: Vec<&str> = out.trim_end().lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "id,name,color,locked");
        assert_eq!(lines[1], "1,gear,blue,false");
    }

    #[test]
    fn test_single_data_row_collapses_on_parse() {
        let parsed = parse(&DelimitedCodec::csv(), b"name,color\ngear,blue\n").unwrap();
        assert_eq!(parsed, json!({"name": "gear", "color": "blue"}));
    }

    #[test]
    fn test_multiple_rows_parse_as_list() {
        let parsed =
            parse(&DelimitedCodec::csv(), b"name\ngear\nsprocket\n").unwrap();
        assert_eq!(parsed, json!([{"name": "gear"}, {"name": "sprocket"}]));
    }

    #[test]
    fn test_short_rows_truncate() {
        let parsed = parse(&DelimitedCodec::csv(), b"a,b,c\n1,2,3\n4,5\n").unwrap();
        assert_eq!(parsed[1], json!({"a": "4", "b": "5"}));
    }

    #[test]
    fn test_header_only_is_none() {
        assert!(parse(&DelimitedCodec::csv(), b"name,color\n").is_none());
        assert!(parse(&DelimitedCodec::csv(), b"").is_none());
    }

    #[test]
    fn test_error_columns() {
        let mut resource = widget(1, "gear", "blue");
        resource.errors.add("name", "Name is taken.");
        resource.errors.add("name", "Name is too long.");

        let payload = Payload::Resource(Box::new(resource));
        let params = AttributeMap::new();
        let ctx = FormatContext {
            payload: &payload,
            descriptor: None,
            params: &params,
            pretty: false,
        };
        let out = String::from_utf8(DelimitedCodec::csv().format(&ctx).to_vec()).unwrap();
        assert!(out.contains("name_ERRORS"));
        assert!(out.contains("Name is taken. and Name is too long."));
    }

    #[test]
    fn test_tsv_uses_tabs() {
        let parsed = parse(&DelimitedCodec::tsv(), b"name\tcolor\ngear\tblue\n").unwrap();
        assert_eq!(parsed, json!({"name": "gear", "color": "blue"}));
    }
}
