//! Request dispatch.
//!
//! The [`Dispatcher`] owns the collaborators and the codec registry,
//! resolves a transport [`Request`] to an action and a target, runs the
//! action, and renders the outcome. Errors flow through the same codec
//! and envelope pipeline as successes: clients always see one shape.

use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use praxis_action::{
    ActionCache, ActionContext, ActionRequest, CustomActionRegistry, Kind, ResourceAction, Target,
};
use praxis_codec::{parse_accept, CodecRegistry, FormatContext, MediaRange, ParseContext};
use praxis_core::{
    envelope, ActionResult, AttributeMap, EventStream, Payload, ResourceDescriptor, ResourceStore,
    RestError, SchemaRegistry, Value,
};

use crate::config::DispatcherConfig;
use crate::path::{parse_path, RoutedPath};
use crate::request::{Request, Response};

/// The front door: routes, negotiates, runs, and renders.
pub struct Dispatcher {
    store: Arc<dyn ResourceStore>,
    schemas: Arc<dyn SchemaRegistry>,
    events: Arc<dyn EventStream>,
    codecs: CodecRegistry,
    cache: Option<Arc<dyn ActionCache>>,
    custom: Option<CustomActionRegistry>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Creates a dispatcher with the default codecs and configuration.
    #[must_use]
    pub fn new(
        store: Arc<dyn ResourceStore>,
        schemas: Arc<dyn SchemaRegistry>,
        events: Arc<dyn EventStream>,
    ) -> Self {
        Self {
            store,
            schemas,
            events,
            codecs: CodecRegistry::with_defaults(),
            cache: None,
            custom: None,
            config: DispatcherConfig::new(),
        }
    }

    /// Replaces the codec registry.
    #[must_use]
    pub fn with_codecs(mut self, codecs: CodecRegistry) -> Self {
        self.codecs = codecs;
        self
    }

    /// Installs an action cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn ActionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Installs custom actions.
    #[must_use]
    pub fn with_custom_actions(mut self, custom: CustomActionRegistry) -> Self {
        self.custom = Some(custom);
        self
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Dispatches a request, or returns `None` when the path does not
    /// match the resource grammar. The caller owns the 404 policy for
    /// unrouted paths; everything routable produces a response.
    #[must_use]
    pub fn dispatch(&self, request: &Request) -> Option<Response> {
        let routed = parse_path(&request.path)?;
        let accept = parse_accept(request.header("Accept").unwrap_or(""));
        let extension = routed.extension.clone();
        let params = parse_query(request.query.as_deref().unwrap_or(""));

        let target = Target {
            resource_type: routed.resource_type.clone(),
            primary_key: routed.primary_key.clone().map(Value::String),
            relation: routed.relation.clone(),
            relation_primary_key: routed.relation_primary_key.clone().map(Value::String),
        };

        let kind = match &routed.action {
            Some(name) => override_kind(name, &routed),
            None => match default_kind(&request.method, &routed) {
                Some(kind) => kind,
                None => {
                    let err = RestError::blocked(format!(
                        "The '{}' method is not supported for this target.",
                        request.method
                    ));
                    return Some(self.render_error(&err, &accept, extension.as_deref(), &params));
                }
            },
        };
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            action = kind.name(),
            resource_type = %target.resource_type,
            "dispatching request"
        );

        let content_type = request.header("Content-Type");
        let input = self
            .codecs
            .negotiate_input(content_type, &self.config.default_input_format)
            .and_then(|codec| {
                codec.parse(&ParseContext {
                    method: &request.method,
                    content_type,
                    body: &request.body,
                })
            });

        let action_request = ActionRequest {
            method: request.method.clone(),
            route: format!("{}/{}", target.resource_type, kind.name()),
            headers: request.headers.clone(),
            params: params.clone(),
            input,
            remote_addr: request.remote_addr.clone(),
        };
        let ctx = ActionContext {
            store: self.store.as_ref(),
            schemas: self.schemas.as_ref(),
            events: self.events.as_ref(),
            cache: self.cache.as_deref(),
            cache_ttl: self.config.cache_ttl,
            custom: self.custom.as_ref(),
            request: &action_request,
            target: &target,
            default_page_size: self.config.default_page_size,
        };

        let response = match ResourceAction::new(kind).run(&ctx) {
            Ok(result) => self.render(&target, result, &accept, extension.as_deref(), &params),
            Err(err) => self.render_error(&err, &accept, extension.as_deref(), &params),
        };
        Some(response)
    }

    fn render(
        &self,
        target: &Target,
        result: ActionResult,
        accept: &[MediaRange],
        extension: Option<&str>,
        params: &AttributeMap,
    ) -> Response {
        let mut headers = result.headers.clone();
        if result.status == StatusCode::NO_CONTENT {
            return Response {
                status: result.status,
                headers,
                body: Bytes::new(),
            };
        }

        // Relation actions answer with the related type, so the payload,
        // not the routed target, decides which schema formats it.
        let type_name = match &result.payload {
            Payload::Resource(resource) => resource.type_name(),
            Payload::Collection(collection) => &collection.resource_type,
            _ => &target.resource_type,
        };
        let descriptor = self.schemas.descriptor(type_name).ok();
        let (content_type, body) = self.format(
            &result.payload,
            descriptor.as_deref(),
            accept,
            extension,
            params,
        );
        headers.insert(0, ("Content-Type".to_string(), content_type));
        Response {
            status: result.status,
            headers,
            body,
        }
    }

    fn render_error(
        &self,
        err: &RestError,
        accept: &[MediaRange],
        extension: Option<&str>,
        params: &AttributeMap,
    ) -> Response {
        let status = err.status_code();
        if status.is_server_error() {
            tracing::warn!(error = %err, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %err, status = status.as_u16(), "request rejected");
        }

        let payload = Payload::Data(envelope::error_value(err));
        let (content_type, body) = self.format(&payload, None, accept, extension, params);
        Response {
            status,
            headers: vec![("Content-Type".to_string(), content_type)],
            body,
        }
    }

    /// Formats a payload through the negotiated codec, falling back to
    /// raw JSON if the registry is empty.
    fn format(
        &self,
        payload: &Payload,
        descriptor: Option<&ResourceDescriptor>,
        accept: &[MediaRange],
        extension: Option<&str>,
        params: &AttributeMap,
    ) -> (String, Bytes) {
        let ctx = FormatContext {
            payload,
            descriptor,
            params,
            pretty: self.config.pretty,
        };
        match self
            .codecs
            .negotiate_output(accept, extension, &self.config.default_output_format)
        {
            Some(codec) => (codec.content_type().to_string(), codec.format(&ctx)),
            None => {
                let body = serde_json::to_vec(&envelope::payload_value(payload))
                    .unwrap_or_default();
                ("application/json".to_string(), Bytes::from(body))
            }
        }
    }
}

/// Maps an explicit action override, switching to the relation variant
/// when the path targets a relation.
fn override_kind(name: &str, routed: &RoutedPath) -> Kind {
    let kind = Kind::from_name(name);
    if routed.relation.is_some() {
        match kind {
            Kind::Create => Kind::CreateRelated,
            Kind::Read => Kind::ReadRelated,
            Kind::Search => Kind::SearchRelated,
            other => other,
        }
    } else {
        kind
    }
}

/// The verb-to-default-action map, split by target arity.
fn default_kind(method: &Method, routed: &RoutedPath) -> Option<Kind> {
    let related = routed.relation.is_some();
    let item = routed.primary_key.is_some();
    match method.as_str() {
        "OPTIONS" => Some(Kind::Options),
        "TRACE" => Some(Kind::Trace),
        "GET" | "HEAD" => Some(if related {
            if routed.relation_primary_key.is_some() {
                Kind::ReadRelated
            } else {
                Kind::SearchRelated
            }
        } else if item {
            Kind::Read
        } else {
            Kind::Search
        }),
        "POST" => {
            if related {
                if routed.relation_primary_key.is_some() {
                    None
                } else {
                    Some(Kind::CreateRelated)
                }
            } else if item {
                Some(Kind::Update)
            } else {
                Some(Kind::Create)
            }
        }
        "PUT" if !related && item => Some(Kind::Replace),
        "DELETE" if !related && item => Some(Kind::Delete),
        "COPY" if !related && item => Some(Kind::Copy),
        _ => None,
    }
}

/// Parses a query string into parameters, folding one level of bracket
/// syntax (`filter[color]=red`) into nested objects.
fn parse_query(query: &str) -> AttributeMap {
    let mut params = AttributeMap::new();
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
    for (key, value) in pairs {
        match (key.find('['), key.ends_with(']')) {
            (Some(open), true) if open > 0 && open + 2 < key.len() => {
                let outer = key[..open].to_string();
                let inner = key[open + 1..key.len() - 1].to_string();
                let entry = params
                    .entry(outer)
                    .or_insert_with(|| Value::Object(serde_json::Map::new()));
                if let Value::Object(map) = entry {
                    map.insert(inner, Value::String(value));
                }
            }
            _ => {
                params.insert(key, Value::String(value));
            }
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn routed(path: &str) -> RoutedPath {
        parse_path(path).unwrap()
    }

    #[test]
    fn test_default_kind_item_verbs() {
        let path = routed("/widgets/42");
        assert_eq!(default_kind(&Method::GET, &path), Some(Kind::Read));
        assert_eq!(default_kind(&Method::POST, &path), Some(Kind::Update));
        assert_eq!(default_kind(&Method::PUT, &path), Some(Kind::Replace));
        assert_eq!(default_kind(&Method::DELETE, &path), Some(Kind::Delete));
        assert_eq!(
            default_kind(&Method::from_bytes(b"COPY").unwrap(), &path),
            Some(Kind::Copy)
        );
    }

    #[test]
    fn test_default_kind_collection_verbs() {
        let path = routed("/widgets");
        assert_eq!(default_kind(&Method::GET, &path), Some(Kind::Search));
        assert_eq!(default_kind(&Method::POST, &path), Some(Kind::Create));
        assert_eq!(default_kind(&Method::PUT, &path), None);
        assert_eq!(default_kind(&Method::OPTIONS, &path), Some(Kind::Options));
    }

    #[test]
    fn test_default_kind_relation_verbs() {
        let path = routed("/widgets/42/parts");
        assert_eq!(default_kind(&Method::GET, &path), Some(Kind::SearchRelated));
        assert_eq!(default_kind(&Method::POST, &path), Some(Kind::CreateRelated));

        let path = routed("/widgets/42/parts/7");
        assert_eq!(default_kind(&Method::GET, &path), Some(Kind::ReadRelated));
        assert_eq!(default_kind(&Method::POST, &path), None);
    }

    #[test]
    fn test_override_kind_gets_related_suffix() {
        assert_eq!(
            override_kind("search", &routed("/widgets/42/parts")),
            Kind::SearchRelated
        );
        assert_eq!(override_kind("search", &routed("/widgets")), Kind::Search);
        assert_eq!(
            override_kind("stats", &routed("/widgets/42/_stats")),
            Kind::Stats
        );
    }

    #[test]
    fn test_parse_query_brackets() {
        let params = parse_query("q=foo&filter[color]=red&filter[size]=3&limit=10");
        assert_eq!(params["q"], json!("foo"));
        assert_eq!(params["filter"]["color"], json!("red"));
        assert_eq!(params["filter"]["size"], json!("3"));
        assert_eq!(params["limit"], json!("10"));
    }

    #[test]
    fn test_parse_query_tolerates_garbage() {
        assert!(parse_query("").is_empty());
        let params = parse_query("a]=[1&b=2");
        assert_eq!(params["b"], json!("2"));
    }
}
