//! POST/PUT/PATCH/DELETE (spec.md §4.1 "Write path", §5 "cross-resource
//! ordering", §4.9 notifications).

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use trellis_notify::ActivityType;
use trellis_rdf::quad::{graphs, vocab};
use trellis_rdf::{Iri, Literal, NamedOrBlank, Quad, ResourceState, Term};
use trellis_storage::{digest_bytes, BinaryStore, DigestAlgorithm, ResourceMeta, ResourceStore};

use super::common;
use super::RequestContext;
use crate::authz::authorize;
use crate::conditional::{self, ConditionalOutcome};
use crate::error::ApiError;
use crate::notifications::notify;
use crate::slug;

/// Validates a request-side `Digest` header against the bytes about to be
/// stored (spec.md §4.7 "`Digest` on a write request is validated against the
/// stored bytes and rejected with `409 Conflict` on mismatch"). Unrecognized
/// algorithms are skipped rather than rejected, matching §4.2's "requests for
/// unsupported algorithms return absent".
fn validate_request_digest(ctx: &RequestContext, body: &[u8]) -> Result<(), ApiError> {
    let Some(header) = ctx.headers.get("digest").and_then(|v| v.to_str().ok()) else { return Ok(()) };
    for entry in header.split(',') {
        let Some((name, expected)) = entry.trim().split_once('=') else { continue };
        let Some(algorithm) = DigestAlgorithm::parse(name.trim()) else { continue };
        let expected = expected.trim();
        let computed = digest_bytes(algorithm, body);
        if computed != expected {
            return Err(ApiError::Conflict(format!("Digest header {name} did not match the request body")));
        }
    }
    Ok(())
}

fn parent_path(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.rfind('/') {
        Some(0) => Some("/".to_string()),
        Some(index) => Some(trimmed[..index].to_string()),
        None => None,
    }
}

pub(crate) fn audit_quad(id: &Iri, action: &str) -> Quad {
    Quad::new(
        graphs::AUDIT.clone(),
        NamedOrBlank::Iri(id.clone()),
        vocab::PROV_ACTIVITY.clone(),
        Term::Literal(Literal::plain(format!("{action} at {}", trellis_rdf::Instant::now().epoch_seconds()))),
    )
}

/// Links a newly created child into its parent's containment graph and, if the
/// parent is a Direct/Indirect container, its membership graph (spec.md §4.1
/// "Containers"). The reverse `isMemberOfRelation` direction is not applied to
/// the child's own graph -- see DESIGN.md.
pub(crate) async fn apply_parent_bookkeeping(
    ctx: &RequestContext,
    parent: &str,
    child_id: &Iri,
    child_quads: &[Quad],
) -> Result<(), ApiError> {
    let parent_internal = common::internal_id(&ctx.state.config.base_url, parent);
    let parent_state = ctx.state.repository.get(parent_internal.as_str()).await?;
    let Some(parent) = parent_state.as_present() else { return Ok(()) };

    ctx.state.repository.resources().add_containment(parent_internal.as_str(), child_id.clone()).await?;

    if let (Some(membership_resource), Some(relation)) = (&parent.membership_resource, &parent.member_relation) {
        let member = match &parent.inserted_content_relation {
            Some(icr) => child_quads
                .iter()
                .find(|q| q.predicate == *icr)
                .and_then(|q| match &q.object {
                    Term::Iri(iri) => Some(iri.clone()),
                    _ => None,
                })
                .unwrap_or_else(|| child_id.clone()),
            None => child_id.clone(),
        };
        ctx.state
            .repository
            .resources()
            .add_membership(membership_resource.as_str(), relation.clone(), member)
            .await?;
    }
    Ok(())
}

pub async fn put(ctx: &RequestContext, body: Bytes) -> Result<Response, ApiError> {
    let base_url = &ctx.state.config.base_url;
    let id = common::internal_id(base_url, &ctx.path);
    let external = common::external_uri(base_url, &ctx.path);
    let is_acl = ctx.query.get("ext").map(String::as_str) == Some("acl");

    authorize(ctx.state.webac.as_ref(), &ctx.state.config, &id, ctx.agent.as_ref(), "PUT", is_acl).await?;

    let existing = ctx.state.repository.get(id.as_str()).await?;
    let expected_modified = existing.as_present().map(|r| r.modified);

    if crate::conditional::requires_precondition(&ctx.headers, ctx.state.config.precondition_required, false) {
        return Err(ApiError::PreconditionRequired);
    }
    if let Some(resource) = existing.as_present() {
        let etag = conditional::rdf_etag(resource.modified, ctx.state.config.weak_etag);
        if let ConditionalOutcome::PreconditionFailed = conditional::check_preconditions(&ctx.headers, &etag, false) {
            return Err(ApiError::PreconditionFailed);
        }
    }

    let content_type = ctx.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let is_rdf = content_type.and_then(trellis_io::RdfSyntax::from_media_type).is_some();

    let interaction_model = common::requested_interaction_model(
        ctx.headers.get(header::LINK).and_then(|v| v.to_str().ok()),
    );

    let (meta, user_quads) = if is_rdf {
        let syntax = content_type.and_then(trellis_io::RdfSyntax::from_media_type).unwrap();
        let text = std::str::from_utf8(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let graph = if is_acl { graphs::ACCESS_CONTROL.clone() } else { graphs::USER_MANAGED.clone() };
        let parsed = common::parse_body(text, syntax, &graph, &Iri::new(external.clone()))?;
        let internal_quads = common::quads_to_internal(parsed, base_url);
        let model = if is_acl {
            existing.as_present().map(|r| r.interaction_model.clone()).unwrap_or(interaction_model)
        } else {
            interaction_model
        };
        (
            ResourceMeta {
                identifier: id.clone(),
                interaction_model: model,
                container: existing.as_present().and_then(|r| r.container.clone()),
                binary: existing.as_present().and_then(|r| r.binary.clone()),
                membership_resource: existing.as_present().and_then(|r| r.membership_resource.clone()),
                member_relation: existing.as_present().and_then(|r| r.member_relation.clone()),
                member_of_relation: existing.as_present().and_then(|r| r.member_of_relation.clone()),
                inserted_content_relation: existing.as_present().and_then(|r| r.inserted_content_relation.clone()),
            },
            internal_quads,
        )
    } else {
        validate_request_digest(ctx, &body)?;
        let binary_id = existing
            .as_present()
            .and_then(|r| r.binary.as_ref())
            .map(|b| b.id.clone())
            .unwrap_or_else(|| ctx.state.binaries.generate_id());
        let mime_type = content_type.map(|s| s.to_string());
        ctx.state.binaries.put(&binary_id, &body, Default::default()).await?;
        let binary_meta = trellis_rdf::BinaryMeta {
            id: binary_id,
            modified: trellis_rdf::Instant::now(),
            mime_type,
            size: Some(body.len() as u64),
        };
        let user_quads = existing
            .as_present()
            .map(|r| r.graph(&graphs::USER_MANAGED).to_vec())
            .unwrap_or_default();
        (
            ResourceMeta {
                identifier: id.clone(),
                interaction_model: vocab::LDP_NON_RDF_SOURCE.clone(),
                container: existing.as_present().and_then(|r| r.container.clone()),
                binary: Some(binary_meta),
                membership_resource: None,
                member_relation: None,
                member_of_relation: None,
                inserted_content_relation: None,
            },
            user_quads,
        )
    };

    let was_create = expected_modified.is_none();
    if was_create && !is_acl {
        if let Some(parent) = parent_path(&ctx.path) {
            let parent_internal = common::internal_id(base_url, &parent);
            let parent_exists = ctx.state.repository.get(parent_internal.as_str()).await?.as_present().is_some();
            if !parent_exists && !ctx.state.config.put_uncontained {
                return Err(ApiError::Conflict(format!("parent container {parent} does not exist")));
            }
        }
    }

    let resource = if was_create {
        ctx.state.repository.create(meta, user_quads.clone()).await?
    } else {
        ctx.state.repository.replace(meta, user_quads.clone(), expected_modified).await?
    };
    let resource = resource.as_present().ok_or(ApiError::NotFound)?.clone();

    if was_create {
        if let Some(parent) = parent_path(&ctx.path) {
            apply_parent_bookkeeping(ctx, &parent, &id, &user_quads).await?;
        }
    }

    if is_acl {
        ctx.state.webac.invalidate(&id);
    }

    ctx.state.repository.add(id.as_str(), &[audit_quad(&id, if was_create { "create" } else { "update" })]).await;
    notify(
        ctx.state.notifications.as_ref(),
        if was_create { ActivityType::Create } else { ActivityType::Update },
        ctx.agent.as_ref(),
        &external,
        &resource.interaction_model,
    )
    .await;

    let etag = conditional::rdf_etag(resource.modified, ctx.state.config.weak_etag);
    let status = if was_create { StatusCode::CREATED } else { StatusCode::NO_CONTENT };
    let mut response = status.into_response();
    if let Ok(value) = HeaderValue::from_str(&etag) {
        response.headers_mut().insert(header::ETAG, value);
    }
    if was_create {
        if let Ok(value) = HeaderValue::from_str(&external) {
            response.headers_mut().insert(header::LOCATION, value);
        }
    }
    Ok(response)
}

/// Auto-vivifies a `BasicContainer` at `path` the first time something is
/// `POST`ed to it (spec.md §8 scenario 4: "creates `BasicContainer c` lazily").
/// Recurses one level at a time, so `POST`ing into a deeply nested path that
/// has never been addressed before provisions every missing ancestor.
async fn lazily_create_container(
    ctx: &RequestContext,
    path: &str,
    id: &Iri,
) -> Result<trellis_rdf::Resource, ApiError> {
    let meta = ResourceMeta {
        identifier: id.clone(),
        interaction_model: vocab::LDP_BASIC_CONTAINER.clone(),
        container: None,
        binary: None,
        membership_resource: None,
        member_relation: None,
        member_of_relation: None,
        inserted_content_relation: None,
    };
    let created = ctx.state.repository.create(meta, Vec::new()).await?;
    let created = created.as_present().ok_or(ApiError::NotFound)?.clone();
    if let Some(grandparent) = parent_path(path) {
        apply_parent_bookkeeping(ctx, &grandparent, id, &[]).await?;
    }
    ctx.state.repository.add(id.as_str(), &[audit_quad(id, "create")]).await;
    Ok(created)
}

pub async fn post(ctx: &RequestContext, body: Bytes) -> Result<Response, ApiError> {
    let base_url = &ctx.state.config.base_url;
    let id = common::internal_id(base_url, &ctx.path);

    authorize(ctx.state.webac.as_ref(), &ctx.state.config, &id, ctx.agent.as_ref(), "POST", false).await?;

    let parent_state = ctx.state.repository.get(id.as_str()).await?;
    let parent = match parent_state {
        ResourceState::Present(parent) => parent,
        ResourceState::Deleted => return Err(ApiError::Gone),
        ResourceState::Missing => lazily_create_container(ctx, &ctx.path, &id).await?,
    };
    if !parent.is_container() {
        return Err(ApiError::MethodNotAllowed);
    }

    let slug = slug::sanitize_slug(ctx.headers.get("slug").and_then(|v| v.to_str().ok())).unwrap_or_else(slug::generate_slug);
    let child_path = format!("{}/{slug}", ctx.path.trim_end_matches('/'));
    let child_id = common::internal_id(base_url, &child_path);
    let child_external = common::external_uri(base_url, &child_path);

    if ctx.state.repository.get(child_id.as_str()).await?.as_present().is_some() {
        return Err(ApiError::Conflict(format!("{child_external} already exists")));
    }

    let content_type = ctx.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let is_rdf = content_type.and_then(trellis_io::RdfSyntax::from_media_type).is_some();
    let interaction_model =
        common::requested_interaction_model(ctx.headers.get(header::LINK).and_then(|v| v.to_str().ok()));

    let (meta, user_quads) = if is_rdf {
        let syntax = content_type.and_then(trellis_io::RdfSyntax::from_media_type).unwrap();
        let text = std::str::from_utf8(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let parsed = common::parse_body(text, syntax, &graphs::USER_MANAGED, &Iri::new(child_external.clone()))?;
        let internal_quads = common::quads_to_internal(parsed, base_url);
        (
            ResourceMeta {
                identifier: child_id.clone(),
                interaction_model,
                container: Some(id.clone()),
                binary: None,
                membership_resource: None,
                member_relation: None,
                member_of_relation: None,
                inserted_content_relation: None,
            },
            internal_quads,
        )
    } else {
        validate_request_digest(ctx, &body)?;
        let binary_id = ctx.state.binaries.generate_id();
        ctx.state.binaries.put(&binary_id, &body, Default::default()).await?;
        let binary_meta = trellis_rdf::BinaryMeta {
            id: binary_id,
            modified: trellis_rdf::Instant::now(),
            mime_type: content_type.map(|s| s.to_string()),
            size: Some(body.len() as u64),
        };
        (
            ResourceMeta {
                identifier: child_id.clone(),
                interaction_model: vocab::LDP_NON_RDF_SOURCE.clone(),
                container: Some(id.clone()),
                binary: Some(binary_meta),
                membership_resource: None,
                member_relation: None,
                member_of_relation: None,
                inserted_content_relation: None,
            },
            Vec::new(),
        )
    };

    let created = ctx.state.repository.create(meta, user_quads.clone()).await?;
    let created = created.as_present().ok_or(ApiError::NotFound)?.clone();

    apply_parent_bookkeeping(ctx, &ctx.path, &child_id, &user_quads).await?;

    ctx.state.repository.add(child_id.as_str(), &[audit_quad(&child_id, "create")]).await;
    notify(ctx.state.notifications.as_ref(), ActivityType::Create, ctx.agent.as_ref(), &child_external, &created.interaction_model).await;

    let etag = conditional::rdf_etag(created.modified, ctx.state.config.weak_etag);
    let mut response = StatusCode::CREATED.into_response();
    if let Ok(value) = HeaderValue::from_str(&child_external) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    if let Ok(value) = HeaderValue::from_str(&etag) {
        response.headers_mut().insert(header::ETAG, value);
    }
    Ok(response)
}

pub async fn patch(ctx: &RequestContext, body: Bytes) -> Result<Response, ApiError> {
    let base_url = &ctx.state.config.base_url;
    let id = common::internal_id(base_url, &ctx.path);
    let external = common::external_uri(base_url, &ctx.path);
    let is_acl = ctx.query.get("ext").map(String::as_str) == Some("acl");

    authorize(ctx.state.webac.as_ref(), &ctx.state.config, &id, ctx.agent.as_ref(), "PATCH", is_acl).await?;

    let existing = ctx.state.repository.get(id.as_str()).await?;
    let resource = match existing {
        ResourceState::Present(r) => r,
        ResourceState::Missing if ctx.state.config.patch_create => {
            return put(ctx, body).await;
        }
        ResourceState::Missing => return Err(ApiError::NotFound),
        ResourceState::Deleted => return Err(ApiError::Gone),
    };

    let etag = conditional::rdf_etag(resource.modified, ctx.state.config.weak_etag);
    if let ConditionalOutcome::PreconditionFailed = conditional::check_preconditions(&ctx.headers, &etag, false) {
        return Err(ApiError::PreconditionFailed);
    }

    let target_graph = if is_acl { graphs::ACCESS_CONTROL.clone() } else { graphs::USER_MANAGED.clone() };
    let mut external_quads = common::quads_to_external(resource.graph(&target_graph), base_url);
    let update_text = std::str::from_utf8(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let update_base = Iri::new(external.clone());

    // A SPARQL-Update PATCH only ever touches the target graph above; an attempt
    // to write a server-managed/containment predicate into it is rejected
    // outright rather than silently applied (spec.md §4.7). The ACL graph has no
    // server-managed predicates of its own, so this check is skipped for `ext=acl`.
    if !is_acl {
        for predicate in trellis_io::template_predicates(update_text, &update_base)? {
            if common::is_server_managed_predicate(&predicate) {
                return Err(ApiError::Conflict(format!(
                    "PATCH may not modify the server-managed predicate {predicate}"
                )));
            }
        }
    }

    trellis_io::apply_update(&mut external_quads, update_text, &update_base)?;
    let user_quads = common::quads_to_internal(external_quads, base_url);

    let meta = ResourceMeta {
        identifier: id.clone(),
        interaction_model: resource.interaction_model.clone(),
        container: resource.container.clone(),
        binary: resource.binary.clone(),
        membership_resource: resource.membership_resource.clone(),
        member_relation: resource.member_relation.clone(),
        member_of_relation: resource.member_of_relation.clone(),
        inserted_content_relation: resource.inserted_content_relation.clone(),
    };
    let updated = ctx.state.repository.replace(meta, user_quads, Some(resource.modified)).await?;
    let updated = updated.as_present().ok_or(ApiError::NotFound)?.clone();

    if is_acl {
        ctx.state.webac.invalidate(&id);
    }

    ctx.state.repository.add(id.as_str(), &[audit_quad(&id, "update")]).await;
    notify(ctx.state.notifications.as_ref(), ActivityType::Update, ctx.agent.as_ref(), &external, &updated.interaction_model).await;

    let etag = conditional::rdf_etag(updated.modified, ctx.state.config.weak_etag);
    let mut response = StatusCode::NO_CONTENT.into_response();
    if let Ok(value) = HeaderValue::from_str(&etag) {
        response.headers_mut().insert(header::ETAG, value);
    }
    Ok(response)
}

/// Plain LDP `DELETE` is non-recursive: a non-empty container is a 409
/// (spec.md §4.3). A `Depth: infinity` header (the WebDAV projection's own
/// DELETE semantics, spec.md §4.8) switches to recursive descent instead --
/// see DESIGN.md for why this stays keyed off the header rather than a
/// separate verb.
pub async fn delete(ctx: &RequestContext) -> Result<Response, ApiError> {
    let base_url = &ctx.state.config.base_url;
    let id = common::internal_id(base_url, &ctx.path);

    authorize(ctx.state.webac.as_ref(), &ctx.state.config, &id, ctx.agent.as_ref(), "DELETE", false).await?;

    let existing = ctx.state.repository.get(id.as_str()).await?;
    let resource = match existing {
        ResourceState::Present(r) => r,
        ResourceState::Missing => return Err(ApiError::NotFound),
        ResourceState::Deleted => return Err(ApiError::Gone),
    };

    let recursive = ctx.headers.get("depth").and_then(|v| v.to_str().ok()).map(|v| v.eq_ignore_ascii_case("infinity")).unwrap_or(false);

    if resource.is_container() && !resource.graph(&graphs::CONTAINMENT).is_empty() && !recursive {
        return Err(ApiError::Conflict(format!("{} is not empty", resource.identifier)));
    }

    let etag = conditional::rdf_etag(resource.modified, ctx.state.config.weak_etag);
    if let ConditionalOutcome::PreconditionFailed = conditional::check_preconditions(&ctx.headers, &etag, false) {
        return Err(ApiError::PreconditionFailed);
    }

    if recursive {
        delete_descendants(ctx, &resource).await?;
    }
    delete_one(ctx, &id, &resource).await?;

    if let Some(parent) = parent_path(&ctx.path) {
        let parent_internal = common::internal_id(base_url, &parent);
        let _ = ctx.state.repository.resources().remove_containment(parent_internal.as_str(), &id).await;
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Deletes every child named in `container`'s containment graph, innermost
/// first, before the container itself is removed by the caller.
async fn delete_descendants(ctx: &RequestContext, container: &trellis_rdf::Resource) -> Result<(), ApiError> {
    for quad in container.graph(&graphs::CONTAINMENT) {
        let Term::Iri(child_id) = &quad.object else { continue };
        let child_state = ctx.state.repository.get(child_id.as_str()).await?;
        let Some(child) = child_state.as_present() else { continue };
        if child.is_container() {
            Box::pin(delete_descendants(ctx, child)).await?;
        }
        delete_one(ctx, child_id, child).await?;
    }
    Ok(())
}

/// The non-recursive part of a delete: tombstones the snapshot, purges the
/// binary, invalidates the WebAC cache, and records audit + notification.
/// Containment bookkeeping on the parent is the caller's responsibility.
async fn delete_one(ctx: &RequestContext, id: &Iri, resource: &trellis_rdf::Resource) -> Result<(), ApiError> {
    ctx.state.repository.delete(id.as_str(), Some(resource.modified)).await?;

    if let Some(binary) = &resource.binary {
        ctx.state.binaries.purge(&binary.id).await;
    }

    ctx.state.webac.invalidate(id);
    ctx.state.repository.add(id.as_str(), &[audit_quad(id, "delete")]).await;
    let external = trellis_rdf::identifier::to_external(id, &ctx.state.config.base_url);
    notify(ctx.state.notifications.as_ref(), ActivityType::Delete, ctx.agent.as_ref(), external.as_str(), &resource.interaction_model).await;
    Ok(())
}
