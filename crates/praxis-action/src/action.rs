//! The verb-driven action state machine.
//!
//! A [`ResourceAction`] pairs a [`Kind`] with the shared run loop: check
//! the verb, load declared parameters, then either *present* the action
//! (a GET against a mutating action returns the affected resource without
//! touching it) or *perform* it. Every branch returns an
//! [`ActionResult`]; only routing-level failures surface as errors.

use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode};
use praxis_core::{
    emit, envelope, ActionResult, AttributeMap, ChangeEvent, Collection, Criteria, EventStream,
    Payload, RelationKind, RelationSpec, Resource, ResourceDescriptor, ResourceStore, RestError,
    RestResult, SchemaRegistry, Scope, SearchPage, Value,
};
use serde_json::json;

use crate::cache::{cache_key, ActionCache};
use crate::custom::CustomActionRegistry;
use crate::kind::Kind;
use crate::params::load_params;
use crate::request::{ActionRequest, Target};

/// Everything an action needs to run, borrowed from the dispatcher.
pub struct ActionContext<'a> {
    /// The persistence collaborator.
    pub store: &'a dyn ResourceStore,
    /// The schema registry.
    pub schemas: &'a dyn SchemaRegistry,
    /// The change-event sink.
    pub events: &'a dyn EventStream,
    /// The optional read/search cache.
    pub cache: Option<&'a dyn ActionCache>,
    /// Lifetime of cache entries written by this action; `None` means
    /// entries live until a mutation invalidates them.
    pub cache_ttl: Option<Duration>,
    /// Host-registered custom actions, if any.
    pub custom: Option<&'a CustomActionRegistry>,
    /// The decoded request.
    pub request: &'a ActionRequest,
    /// The resolved target.
    pub target: &'a Target,
    /// Page size applied when a search names none.
    pub default_page_size: u32,
}

/// Where an action is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    /// Not yet run.
    Idle,
    /// Answering a GET against a mutating action.
    Presenting,
    /// Executing the action proper.
    Performing,
    /// Finished, successfully or not.
    Responded,
}

/// A single runnable action instance.
pub struct ResourceAction {
    kind: Kind,
    state: ActionState,
}

impl ResourceAction {
    /// Creates an idle action of the given kind.
    #[must_use]
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            state: ActionState::Idle,
        }
    }

    /// The action kind.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Runs the action against the context's target.
    ///
    /// # Errors
    ///
    /// Returns a [`RestError`] for routing-level failures: unknown types,
    /// missing parameters, unsupported verbs, absent resources. Outcomes
    /// the client can act on (validation failures, blocked deletes) come
    /// back as an [`ActionResult`] carrying the offending resource.
    pub fn run(&mut self, ctx: &ActionContext<'_>) -> RestResult<ActionResult> {
        tracing::debug!(
            action = self.kind.name(),
            resource_type = %ctx.target.resource_type,
            method = %ctx.request.method,
            "running resource action"
        );
        let result = self.dispatch(ctx);
        self.state = ActionState::Responded;
        result
    }

    fn dispatch(&mut self, ctx: &ActionContext<'_>) -> RestResult<ActionResult> {
        let descriptor = ctx.schemas.descriptor(&ctx.target.resource_type)?;

        // A path-resolved relation counts as the declared parameter.
        let mut context_params = ctx.request.params.clone();
        if let Some(relation) = &ctx.target.relation {
            context_params
                .entry("relation".to_string())
                .or_insert_with(|| Value::String(relation.clone()));
        }
        let params = load_params(&self.kind.params(), &context_params)?;
        let input = ctx.request.input_map();

        let presenting = match self.kind.verb() {
            Some(verb) if verb != ctx.request.method.as_str() => {
                if ctx.request.method == Method::GET {
                    true
                } else {
                    return Err(RestError::MethodNotSupported {
                        action: self.kind.label(&descriptor),
                        method: ctx.request.method.to_string(),
                    });
                }
            }
            _ => false,
        };

        if presenting {
            self.state = ActionState::Presenting;
            self.present(ctx, &descriptor, &params)
        } else {
            self.state = ActionState::Performing;
            let kind = self.kind.clone();
            self.perform_kind(&kind, ctx, ctx.target, &descriptor, &params, input.as_ref())
        }
    }

    /// Answers a GET against a mutating action: show what the action
    /// would affect, change nothing.
    fn present(
        &self,
        ctx: &ActionContext<'_>,
        descriptor: &ResourceDescriptor,
        params: &AttributeMap,
    ) -> RestResult<ActionResult> {
        match &self.kind {
            Kind::Create => {
                let resource = ctx.store.instantiate(&descriptor.name, "create")?;
                Ok(ActionResult::ok(Payload::Resource(resource)))
            }
            Kind::CreateRelated => {
                let relation = resolve_relation(ctx, descriptor, params)?;
                let owner = load_item(ctx, ctx.target, descriptor, &Criteria::new())?;
                let resource = instantiate_related(ctx, &relation, owner.as_ref())?;
                Ok(ActionResult::ok(Payload::Resource(resource)))
            }
            Kind::Update | Kind::Replace | Kind::Delete | Kind::Copy => {
                let resource = load_item(ctx, ctx.target, descriptor, &Criteria::new())?;
                Ok(ActionResult::ok(Payload::Resource(resource)))
            }
            Kind::Bulk => Err(RestError::NotImplemented),
            other => {
                // Lenient and read-style actions present by performing.
                let kind = other.clone();
                self.perform_kind(&kind, ctx, ctx.target, descriptor, params, None)
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn perform_kind(
        &self,
        kind: &Kind,
        ctx: &ActionContext<'_>,
        target: &Target,
        descriptor: &ResourceDescriptor,
        params: &AttributeMap,
        input: Option<&AttributeMap>,
    ) -> RestResult<ActionResult> {
        match kind {
            Kind::Create => {
                let mut resource = ctx.store.instantiate(&descriptor.name, kind.scenario())?;
                if let Some(input) = input {
                    resource.set_attributes(input);
                }
                save_outcome(ctx, resource, "create", &descriptor.name, &AttributeMap::new())
            }

            Kind::Read => {
                let criteria = request_criteria(ctx, descriptor)?;
                let qualifier = target
                    .primary_key
                    .as_ref()
                    .map(envelope::pk_string)
                    .unwrap_or_default();
                let key = cache_key(&descriptor.name, &criteria, &[&qualifier]);
                if let Some(cache) = ctx.cache {
                    if let Some(value) = cache.read(key) {
                        return Ok(ActionResult::ok(Payload::Data(value)));
                    }
                }
                let resource = load_item(ctx, target, descriptor, &criteria)?;
                if let Some(cache) = ctx.cache {
                    cache.write(
                        key,
                        &envelope::resource_value(resource.as_ref()),
                        ctx.cache_ttl,
                        std::slice::from_ref(&descriptor.name),
                    );
                }
                Ok(ActionResult::ok(Payload::Resource(resource)))
            }

            Kind::Update => {
                let mut resource = load_item(ctx, target, descriptor, &Criteria::new())?;
                let before = resource.attributes();
                if let Some(input) = input {
                    resource.set_attributes(input);
                }
                if ctx.store.save(resource.as_mut())? {
                    publish_change(ctx, "update", &descriptor.name, resource.as_ref(), &before);
                    Ok(ActionResult::ok(Payload::Resource(resource)))
                } else {
                    Ok(ActionResult::new(
                        StatusCode::BAD_REQUEST,
                        Payload::Resource(resource),
                    ))
                }
            }

            Kind::Replace => {
                let Some(pk) = target.primary_key.clone() else {
                    return Err(missing_target());
                };
                // PUT is a recreate: any existing resource is deleted
                // first, and an absent one is not an error.
                if let Some(mut existing) =
                    ctx.store
                        .find_by_primary_key(&descriptor.name, &pk, &Criteria::new())?
                {
                    if !ctx.store.delete(existing.as_mut())? {
                        if existing.has_errors() {
                            return Ok(ActionResult::new(
                                StatusCode::METHOD_NOT_ALLOWED,
                                Payload::Resource(existing),
                            ));
                        }
                        return Err(RestError::unexpected(
                            "Could not delete the existing resource.",
                        ));
                    }
                }
                let mut resource = ctx.store.instantiate(&descriptor.name, "replace")?;
                resource.set_primary_key(pk);
                if let Some(input) = input {
                    resource.set_attributes(input);
                }
                save_outcome(ctx, resource, "replace", &descriptor.name, &AttributeMap::new())
            }

            Kind::Delete => {
                let mut resource = load_item(ctx, target, descriptor, &Criteria::new())?;
                if ctx.store.delete(resource.as_mut())? {
                    resource.mark_deleted();
                    let event = ChangeEvent::new("delete", &descriptor.name)
                        .with_primary_key(resource.primary_key().unwrap_or(Value::Null));
                    emit(ctx.events, &event);
                    if let Some(cache) = ctx.cache {
                        cache.invalidate(&descriptor.name);
                    }
                    Ok(ActionResult::new(
                        StatusCode::NO_CONTENT,
                        Payload::Resource(resource),
                    ))
                } else if resource.has_errors() {
                    Ok(ActionResult::new(
                        StatusCode::METHOD_NOT_ALLOWED,
                        Payload::Resource(resource),
                    ))
                } else {
                    Err(RestError::unexpected(
                        "Could not delete the specified resource.",
                    ))
                }
            }

            Kind::Search => {
                let mut criteria = request_criteria(ctx, descriptor)?;
                if criteria.limit.is_none() {
                    criteria.limit = Some(ctx.default_page_size);
                }
                let key = cache_key(&descriptor.name, &criteria, &[]);
                if let Some(cache) = ctx.cache {
                    if let Some(value) = cache.read(key) {
                        return Ok(ActionResult::ok(Payload::Data(value)));
                    }
                }
                let page = ctx.store.search(&descriptor.name, &criteria)?;
                let collection = build_collection(
                    descriptor,
                    &criteria,
                    page,
                    format!("/{}", descriptor.path_segment()),
                );
                if let Some(cache) = ctx.cache {
                    cache.write(
                        key,
                        &envelope::collection_value(&collection),
                        ctx.cache_ttl,
                        std::slice::from_ref(&descriptor.name),
                    );
                }
                Ok(ActionResult::ok(Payload::Collection(collection)))
            }

            Kind::Aggregate => {
                let stats = ctx.store.aggregate(&descriptor.name)?;
                let base = format!("/{}", descriptor.path_segment());
                Ok(ActionResult::ok(Payload::Data(json!({
                    "stats": stats,
                    "_links": {
                        "self": {
                            "title": kind.label(descriptor),
                            "href": format!("{base}/_aggregate"),
                        },
                        "subject": {
                            "title": descriptor.plural_label,
                            "href": base,
                            "profile": [descriptor.name],
                        },
                    },
                }))))
            }

            Kind::Stats => {
                let resource = load_item(ctx, target, descriptor, &Criteria::new())?;
                let stats = ctx.store.stats(resource.as_ref())?;
                let pk = resource.primary_key().unwrap_or(Value::Null);
                let item_href =
                    format!("/{}/{}", descriptor.path_segment(), envelope::pk_string(&pk));
                let subject_title = resource
                    .instance_label()
                    .unwrap_or_else(|| descriptor.label.clone());
                Ok(ActionResult::ok(Payload::Data(json!({
                    "stats": stats,
                    "_links": {
                        "self": {
                            "title": kind.label(descriptor),
                            "href": format!("{item_href}/_stats"),
                        },
                        "subject": {
                            "title": subject_title,
                            "href": item_href,
                            "profile": [descriptor.name],
                        },
                    },
                }))))
            }

            Kind::Options => {
                let item_actions: serde_json::Map<String, Value> = Kind::item_kinds()
                    .iter()
                    .map(|kind| {
                        (
                            kind.name().to_string(),
                            serde_json::to_value(kind.describe(descriptor))
                                .unwrap_or(Value::Null),
                        )
                    })
                    .collect();
                let collection_actions: serde_json::Map<String, Value> = Kind::collection_kinds()
                    .iter()
                    .map(|kind| {
                        (
                            kind.name().to_string(),
                            serde_json::to_value(kind.describe(descriptor))
                                .unwrap_or(Value::Null),
                        )
                    })
                    .collect();
                Ok(ActionResult::ok(Payload::Data(json!({
                    "label": descriptor.label,
                    "collectionLabel": descriptor.plural_label,
                    "attributes": descriptor.attributes,
                    "itemActions": item_actions,
                    "collectionActions": collection_actions,
                }))))
            }

            Kind::Trace => {
                let mut headers = serde_json::Map::new();
                for (name, value) in &ctx.request.headers {
                    headers.insert(
                        name.as_str().to_string(),
                        Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
                    );
                }
                let request_params: serde_json::Map<String, Value> = ctx
                    .request
                    .params
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect();
                Ok(ActionResult::ok(Payload::Data(json!({
                    "ip": ctx.request.remote_addr,
                    "headers": headers,
                    "params": request_params,
                    "input": ctx.request.input.clone().unwrap_or(Value::Null),
                    "route": ctx.request.route,
                }))))
            }

            Kind::Copy => {
                let destination = ctx
                    .request
                    .header("Destination")
                    .map(ToString::to_string)
                    .or_else(|| {
                        ctx.request
                            .params
                            .get("_destination")
                            .and_then(Value::as_str)
                            .map(ToString::to_string)
                    })
                    .or_else(|| {
                        input
                            .and_then(|map| map.get("_destination"))
                            .and_then(Value::as_str)
                            .map(ToString::to_string)
                    });
                let Some(destination) = destination else {
                    return Err(RestError::validation(
                        "Invalid request, no 'Destination' header present.",
                    ));
                };
                let source = load_item(ctx, target, descriptor, &Criteria::new())?;
                let (dest_type, dest_pk) = parse_destination(&destination, ctx.schemas)?;
                let dest_descriptor = ctx.schemas.descriptor(&dest_type)?;

                // The source's writable attributes seed the copy; an
                // explicit request body overrides them.
                let mut copy_input = AttributeMap::new();
                for (name, value) in source.attributes() {
                    let writable = descriptor
                        .attributes
                        .get(&name)
                        .is_some_and(|attr| attr.is_writable);
                    if writable {
                        copy_input.insert(name, value);
                    }
                }
                if let Some(input) = input {
                    for (name, value) in input {
                        copy_input.insert(name.clone(), value.clone());
                    }
                }

                let dest_target = Target::item(dest_type, dest_pk);
                self.perform_kind(
                    &Kind::Replace,
                    ctx,
                    &dest_target,
                    &dest_descriptor,
                    params,
                    Some(&copy_input),
                )
            }

            Kind::Bulk => Err(RestError::NotImplemented),

            Kind::CreateRelated => {
                let relation = resolve_relation(ctx, descriptor, params)?;
                let owner = load_item(ctx, target, descriptor, &Criteria::new())?;
                let mut resource = instantiate_related(ctx, &relation, owner.as_ref())?;
                if let Some(input) = input {
                    resource.set_attributes(input);
                }
                save_outcome(
                    ctx,
                    resource,
                    "create",
                    &relation.related.name,
                    &AttributeMap::new(),
                )
            }

            Kind::ReadRelated => {
                let relation = resolve_relation(ctx, descriptor, params)?;
                let owner = load_item(ctx, target, descriptor, &Criteria::new())?;
                let Some(pk) = &target.relation_primary_key else {
                    return Err(missing_target());
                };
                let criteria = request_criteria(ctx, &relation.related)?;
                let resource = ctx
                    .store
                    .find_by_primary_key(&relation.related.name, pk, &criteria)?
                    .ok_or_else(not_found)?;

                // The related resource must actually belong to the owner.
                if let (Some(fk), RelationKind::HasMany | RelationKind::HasOne) =
                    (&relation.spec.foreign_key, relation.spec.kind)
                {
                    let owner_pk = owner.primary_key().unwrap_or(Value::Null);
                    let attached = resource.attributes().get(fk).is_some_and(|value| {
                        envelope::pk_string(value) == envelope::pk_string(&owner_pk)
                    });
                    if !attached {
                        return Err(not_found());
                    }
                }
                Ok(ActionResult::ok(Payload::Resource(resource)))
            }

            Kind::SearchRelated => {
                let relation = resolve_relation(ctx, descriptor, params)?;
                let owner = load_item(ctx, target, descriptor, &Criteria::new())?;
                let mut criteria = request_criteria(ctx, &relation.related)?;
                if criteria.limit.is_none() {
                    criteria.limit = Some(ctx.default_page_size);
                }
                let effective = relation_criteria(&relation, owner.as_ref()).merge(&criteria);
                let page = ctx.store.search(&relation.related.name, &effective)?;
                let owner_pk = owner.primary_key().unwrap_or(Value::Null);
                let base_path = format!(
                    "/{}/{}/{}",
                    descriptor.path_segment(),
                    envelope::pk_string(&owner_pk),
                    relation.name
                );
                let collection = build_collection(&relation.related, &criteria, page, base_path);
                Ok(ActionResult::ok(Payload::Collection(collection)))
            }

            Kind::Custom(name) => {
                let callback = ctx
                    .custom
                    .and_then(|registry| registry.get(name))
                    .ok_or_else(|| RestError::not_found(format!("Unknown action '{name}'.")))?;
                let loaded = match &target.primary_key {
                    Some(_) => Some(load_item(ctx, target, descriptor, &Criteria::new())?),
                    None => None,
                };
                callback(ctx, input, loaded)
            }
        }
    }
}

/// A relation resolved against the owner's descriptor.
struct ResolvedRelation {
    name: String,
    spec: RelationSpec,
    related: Arc<ResourceDescriptor>,
}

fn resolve_relation(
    ctx: &ActionContext<'_>,
    descriptor: &ResourceDescriptor,
    params: &AttributeMap,
) -> RestResult<ResolvedRelation> {
    let name = ctx
        .target
        .relation
        .clone()
        .or_else(|| {
            params
                .get("relation")
                .and_then(Value::as_str)
                .map(ToString::to_string)
        })
        .ok_or_else(|| RestError::missing_parameter("relation"))?;

    let Some(template) = descriptor.relation_link(&name) else {
        return Err(RestError::unknown_embed(name));
    };
    let Some(spec) = template.relation.clone() else {
        return Err(RestError::unknown_embed(name));
    };
    let related_type = template.profile.first().ok_or_else(|| {
        RestError::unexpected(format!("Relation '{name}' declares no target type."))
    })?;
    let related = ctx.schemas.descriptor(related_type)?;
    Ok(ResolvedRelation {
        name,
        spec,
        related,
    })
}

/// The criteria restricting a related search to the owner's rows.
fn relation_criteria(relation: &ResolvedRelation, owner: &dyn Resource) -> Criteria {
    match (&relation.spec.foreign_key, relation.spec.kind) {
        (Some(fk), RelationKind::HasMany | RelationKind::HasOne) => {
            Criteria::new().with_filter(fk.clone(), owner.primary_key().unwrap_or(Value::Null))
        }
        (Some(fk), RelationKind::BelongsTo) => {
            let key = owner.attributes().get(fk).cloned().unwrap_or(Value::Null);
            match relation.related.primary_key.first() {
                Some(pk_attr) => Criteria::new().with_filter(pk_attr.clone(), key),
                None => Criteria::new(),
            }
        }
        _ => Criteria::new().with_scope(Scope::WithParams(
            relation.name.clone(),
            vec![owner.primary_key().unwrap_or(Value::Null)],
        )),
    }
}

fn instantiate_related(
    ctx: &ActionContext<'_>,
    relation: &ResolvedRelation,
    owner: &dyn Resource,
) -> RestResult<Box<dyn Resource>> {
    let mut resource = ctx.store.instantiate(&relation.related.name, "create")?;
    if let (Some(fk), RelationKind::HasMany | RelationKind::HasOne) =
        (&relation.spec.foreign_key, relation.spec.kind)
    {
        let mut defaults = AttributeMap::new();
        defaults.insert(fk.clone(), owner.primary_key().unwrap_or(Value::Null));
        resource.set_attributes(&defaults);
    }
    Ok(resource)
}

/// Loads the item the target names, or fails with 401/404.
fn load_item(
    ctx: &ActionContext<'_>,
    target: &Target,
    descriptor: &ResourceDescriptor,
    criteria: &Criteria,
) -> RestResult<Box<dyn Resource>> {
    let Some(pk) = &target.primary_key else {
        return Err(missing_target());
    };
    ctx.store
        .find_by_primary_key(&descriptor.name, pk, criteria)?
        .ok_or_else(not_found)
}

/// Builds the request-derived criteria, validating embed names against
/// the descriptor's declared relations.
fn request_criteria(
    ctx: &ActionContext<'_>,
    descriptor: &ResourceDescriptor,
) -> RestResult<Criteria> {
    let criteria = Criteria::from_params(&ctx.request.params)?;
    for name in &criteria.embed {
        if descriptor.relation_link(name).is_none() {
            return Err(RestError::unknown_embed(name.clone()));
        }
    }
    Ok(criteria)
}

/// Saves a freshly built resource: 201 plus a change event on success,
/// 400 with the recorded errors on validation failure.
fn save_outcome(
    ctx: &ActionContext<'_>,
    mut resource: Box<dyn Resource>,
    event_name: &str,
    resource_type: &str,
    before: &AttributeMap,
) -> RestResult<ActionResult> {
    if ctx.store.save(resource.as_mut())? {
        publish_change(ctx, event_name, resource_type, resource.as_ref(), before);
        Ok(ActionResult::new(
            StatusCode::CREATED,
            Payload::Resource(resource),
        ))
    } else {
        Ok(ActionResult::new(
            StatusCode::BAD_REQUEST,
            Payload::Resource(resource),
        ))
    }
}

/// Announces a successful mutation: emits the change event and drops
/// every cache entry built from the mutated type.
fn publish_change(
    ctx: &ActionContext<'_>,
    event_name: &str,
    resource_type: &str,
    resource: &dyn Resource,
    before: &AttributeMap,
) {
    let event = ChangeEvent::new(event_name, resource_type)
        .with_primary_key(resource.primary_key().unwrap_or(Value::Null))
        .with_diff(before, &resource.attributes());
    emit(ctx.events, &event);
    if let Some(cache) = ctx.cache {
        cache.invalidate(resource_type);
    }
}

fn build_collection(
    descriptor: &ResourceDescriptor,
    criteria: &Criteria,
    page: SearchPage,
    base_path: String,
) -> Collection {
    Collection {
        resource_type: descriptor.name.clone(),
        container_name: descriptor.name.clone(),
        label: descriptor.plural_label.clone(),
        items: page.items,
        total: page.total,
        limit: criteria.limit,
        current_page: criteria.page.unwrap_or(0),
        params: criteria.to_query_params(),
        base_path,
    }
}

/// Parses a Destination header into a type name and primary key.
///
/// Absolute URLs are accepted; only the path is considered. The path must
/// name exactly a collection segment and a key.
fn parse_destination(destination: &str, schemas: &dyn SchemaRegistry) -> RestResult<(String, Value)> {
    let path = match destination.find("://") {
        Some(index) => {
            let rest = &destination[index + 3..];
            rest.find('/').map_or("", |slash| &rest[slash..])
        }
        None => destination,
    };
    let mut segments = path.trim_matches('/').split('/');
    let segment = segments.next().unwrap_or_default();
    let pk = segments.next().unwrap_or_default();
    if segment.is_empty() || pk.is_empty() || segments.next().is_some() {
        return Err(RestError::validation("Invalid destination specified."));
    }
    let type_name = camel_case(segment);
    schemas.descriptor(&type_name)?;
    Ok((type_name, Value::String(pk.to_string())))
}

fn camel_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut upper_next = false;
    for ch in segment.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn missing_target() -> RestError {
    RestError::Unauthorized {
        message: "Invalid request, missing parameter(s).".to_string(),
    }
}

fn not_found() -> RestError {
    RestError::not_found("The specified resource cannot be found.")
}
