//! C11: the WebDAV projection. Maps `PROPFIND`/`PROPPATCH`/`MKCOL`/`COPY`/`MOVE`
//! onto the LDP primitives in `ldp::write` and `ldp::read` (spec.md §4.8).
//!
//! None of these verbs touch the store directly -- they are thin translations
//! that end up calling the same `Repository`/`BinaryStore` calls the plain LDP
//! handlers use, so containment, audit, Memento, and notification bookkeeping
//! stay identical between the two protocol surfaces.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use trellis_rdf::quad::{graphs, vocab};
use trellis_rdf::{Iri, Literal, NamedOrBlank, Quad, ResourceState, Term};
use trellis_storage::{BinaryStore, ResourceMeta};

use super::ldp::common;
use super::ldp::write::apply_parent_bookkeeping;
use super::ldp::RequestContext;
use crate::authz::authorize;
use crate::error::ApiError;

const DAV_NS: &str = "DAV:";

fn multistatus(body: String) -> Response {
    let mut response = (StatusCode::from_u16(207).unwrap(), body).into_response();
    response.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static("application/xml; charset=utf-8"));
    response
}

fn last_segment(path: &str) -> (String, String) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => ("/".to_string(), trimmed[1..].to_string()),
        Some(index) => (trimmed[..index].to_string(), trimmed[index + 1..].to_string()),
        None => ("/".to_string(), trimmed.to_string()),
    }
}

/// `MKCOL` is a `POST` of `ldp:BasicContainer` onto the parent with the final
/// path segment used as the `Slug` (spec.md §4.8).
pub async fn mkcol(ctx: &RequestContext) -> Result<Response, ApiError> {
    let (parent_path, slug) = last_segment(&ctx.path);
    if slug.is_empty() {
        return Err(ApiError::BadRequest("MKCOL requires a collection name".to_string()));
    }

    let base_url = &ctx.state.config.base_url;
    let parent_id = common::internal_id(base_url, &parent_path);
    authorize(ctx.state.webac.as_ref(), &ctx.state.config, &parent_id, ctx.agent.as_ref(), "MKCOL", false).await?;

    let parent_state = ctx.state.repository.get(parent_id.as_str()).await?;
    if !parent_state.as_present().map(|r| r.is_container()).unwrap_or(false) {
        return Err(ApiError::Conflict(format!("{parent_path} is not a container")));
    }

    let child_id = common::internal_id(base_url, &ctx.path);
    let child_external = common::external_uri(base_url, &ctx.path);
    if ctx.state.repository.get(child_id.as_str()).await?.as_present().is_some() {
        return Err(ApiError::Conflict(format!("{child_external} already exists")));
    }

    let meta = ResourceMeta {
        identifier: child_id.clone(),
        interaction_model: vocab::LDP_BASIC_CONTAINER.clone(),
        container: Some(parent_id.clone()),
        binary: None,
        membership_resource: None,
        member_relation: None,
        member_of_relation: None,
        inserted_content_relation: None,
    };
    ctx.state.repository.create(meta, Vec::new()).await?;
    apply_parent_bookkeeping(ctx, &parent_path, &child_id, &[]).await?;
    ctx.state.repository.add(child_id.as_str(), &[super::ldp::write::audit_quad(&child_id, "create")]).await;

    let mut response = StatusCode::CREATED.into_response();
    if let Ok(value) = HeaderValue::from_str(&child_external) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    Ok(response)
}

fn destination_path(ctx: &RequestContext) -> Result<String, ApiError> {
    let destination = ctx
        .headers
        .get("destination")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Destination header required".to_string()))?;
    let base = ctx.state.config.base_url.trim_end_matches('/');
    match destination.strip_prefix(base) {
        Some(suffix) => Ok(format!("/{}", suffix.trim_start_matches('/'))),
        None => Err(ApiError::BadRequest("Destination outside this deployment".to_string())),
    }
}

fn depth(ctx: &RequestContext) -> &'static str {
    match ctx.headers.get("depth").and_then(|v| v.to_str().ok()) {
        Some(d) if d.eq_ignore_ascii_case("0") => "0",
        Some(d) if d.eq_ignore_ascii_case("infinity") => "infinity",
        _ => "1",
    }
}

/// Copies one resource's user-managed quads (and binary bytes, for an LDP-NR)
/// from `src_path` to `dest_path`, then recurses into children when `recursive`
/// (spec.md §4.8 "COPY"). Returns the copied resource's interaction model.
async fn copy_one(ctx: &RequestContext, src_path: &str, dest_path: &str, recursive: bool) -> Result<(), ApiError> {
    let base_url = &ctx.state.config.base_url;
    let src_id = common::internal_id(base_url, src_path);
    let dest_id = common::internal_id(base_url, dest_path);

    let src = ctx.state.repository.get(src_id.as_str()).await?;
    let src = src.as_present().ok_or(ApiError::NotFound)?.clone();

    if ctx.state.repository.get(dest_id.as_str()).await?.as_present().is_some() {
        return Err(ApiError::Conflict(format!("{dest_path} already exists")));
    }

    let (parent_path, _) = last_segment(dest_path);
    let parent_id = common::internal_id(base_url, &parent_path);
    if ctx.state.repository.get(parent_id.as_str()).await?.as_present().is_none() {
        return Err(ApiError::Conflict(format!("{parent_path} does not exist")));
    }

    let binary = match &src.binary {
        Some(meta) => {
            let bytes = {
                use futures::TryStreamExt;
                let stream = ctx.state.binaries.get(&meta.id).await?;
                let chunks: Vec<Bytes> = stream.try_collect().await.map_err(|e| ApiError::Internal(e.into()))?;
                chunks.concat()
            };
            let new_binary_id = ctx.state.binaries.generate_id();
            ctx.state.binaries.put(&new_binary_id, &bytes, Default::default()).await?;
            Some(trellis_rdf::BinaryMeta {
                id: new_binary_id,
                modified: trellis_rdf::Instant::now(),
                mime_type: meta.mime_type.clone(),
                size: meta.size,
            })
        }
        None => None,
    };

    let meta = ResourceMeta {
        identifier: dest_id.clone(),
        interaction_model: src.interaction_model.clone(),
        container: Some(parent_id.clone()),
        binary,
        membership_resource: src.membership_resource.clone(),
        member_relation: src.member_relation.clone(),
        member_of_relation: src.member_of_relation.clone(),
        inserted_content_relation: src.inserted_content_relation.clone(),
    };
    let user_quads = src.graph(&graphs::USER_MANAGED).to_vec();
    ctx.state.repository.create(meta, user_quads.clone()).await?;
    apply_parent_bookkeeping(ctx, &parent_path, &dest_id, &user_quads).await?;
    ctx.state.repository.add(dest_id.as_str(), &[super::ldp::write::audit_quad(&dest_id, "create")]).await;

    if recursive && src.is_container() {
        for quad in src.graph(&graphs::CONTAINMENT) {
            let Term::Iri(child_id) = &quad.object else { continue };
            let child_external = trellis_rdf::identifier::to_external(child_id, base_url);
            let child_path = child_external.as_str().strip_prefix(ctx.state.config.base_url.trim_end_matches('/')).unwrap_or("").to_string();
            let (_, child_slug) = last_segment(&child_path);
            let child_dest = format!("{}/{child_slug}", dest_path.trim_end_matches('/'));
            Box::pin(copy_one(ctx, &child_path, &child_dest, true)).await?;
        }
    }

    Ok(())
}

/// `COPY`: `Depth: 0|1|infinity`; destination parent must exist, destination
/// itself must not (spec.md §4.8).
pub async fn copy(ctx: &RequestContext) -> Result<Response, ApiError> {
    let base_url = &ctx.state.config.base_url;
    let src_id = common::internal_id(base_url, &ctx.path);
    authorize(ctx.state.webac.as_ref(), &ctx.state.config, &src_id, ctx.agent.as_ref(), "COPY", false).await?;

    let dest_path = destination_path(ctx)?;
    let recursive = depth(ctx) != "0";
    copy_one(ctx, &ctx.path, &dest_path, recursive).await?;

    let dest_external = common::external_uri(base_url, &dest_path);
    let mut response = StatusCode::CREATED.into_response();
    if let Ok(value) = HeaderValue::from_str(&dest_external) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    Ok(response)
}

/// `MOVE`: a recursive `COPY` followed by a recursive `DELETE` of the source
/// (spec.md §4.8). Not atomic across the two steps -- see DESIGN.md.
pub async fn r#move(ctx: &RequestContext) -> Result<Response, ApiError> {
    let base_url = &ctx.state.config.base_url;
    let src_id = common::internal_id(base_url, &ctx.path);
    authorize(ctx.state.webac.as_ref(), &ctx.state.config, &src_id, ctx.agent.as_ref(), "MOVE", false).await?;

    let dest_path = destination_path(ctx)?;
    copy_one(ctx, &ctx.path, &dest_path, true).await?;

    let delete_ctx = RequestContext {
        state: ctx.state.clone(),
        path: ctx.path.clone(),
        headers: {
            let mut headers = ctx.headers.clone();
            headers.insert("depth", HeaderValue::from_static("infinity"));
            headers
        },
        query: ctx.query.clone(),
        agent: ctx.agent.clone(),
        method: axum::http::Method::DELETE,
    };
    super::ldp::write::delete(&delete_ctx).await?;

    let dest_external = common::external_uri(base_url, &dest_path);
    let mut response = StatusCode::NO_CONTENT.into_response();
    if let Ok(value) = HeaderValue::from_str(&dest_external) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    Ok(response)
}

/// Splits a `{namespace}local-name` Clark-notation-ish predicate back into the
/// `(namespace, local-name)` pair a WebDAV `<prop>` element needs -- the inverse
/// of `qname_to_predicate` (spec.md §4.8 "Round-trip").
fn predicate_to_qname(predicate: &Iri) -> (String, String) {
    let value = predicate.as_str();
    match value.rfind(['#', '/']) {
        Some(index) => (value[..=index].to_string(), value[index + 1..].to_string()),
        None => (DAV_NS.to_string(), value.to_string()),
    }
}

fn qname_to_predicate(namespace: &str, local_name: &str) -> Iri {
    if namespace.ends_with(['#', '/']) {
        Iri::new(format!("{namespace}{local_name}"))
    } else {
        Iri::new(format!("{namespace}#{local_name}"))
    }
}

fn synthetic_properties(resource: &trellis_rdf::Resource, external: &str) -> Vec<(String, String, String)> {
    let resourcetype = if resource.is_container() {
        "<collection xmlns=\"DAV:\"/>".to_string()
    } else {
        String::new()
    };
    let content_type = resource
        .binary
        .as_ref()
        .and_then(|b| b.mime_type.clone())
        .unwrap_or_else(|| "text/turtle".to_string());
    let _ = external;
    vec![
        (DAV_NS.to_string(), "resourcetype".to_string(), resourcetype),
        (DAV_NS.to_string(), "getlastmodified".to_string(), resource.modified.epoch_seconds().to_string()),
        (DAV_NS.to_string(), "getcontenttype".to_string(), content_type),
    ]
}

/// `PROPFIND`: maps requested WebDAV properties onto the resource's
/// user-managed triples, plus the synthetic `getcontenttype`/`getlastmodified`/
/// `resourcetype` properties (spec.md §4.8).
pub async fn propfind(ctx: &RequestContext, body: Bytes) -> Result<Response, ApiError> {
    let base_url = &ctx.state.config.base_url;
    let id = common::internal_id(base_url, &ctx.path);
    let external = common::external_uri(base_url, &ctx.path);

    authorize(ctx.state.webac.as_ref(), &ctx.state.config, &id, ctx.agent.as_ref(), "PROPFIND", false).await?;

    let state = ctx.state.repository.get(id.as_str()).await?;
    let resource = match state {
        ResourceState::Present(r) => r,
        ResourceState::Missing => return Err(ApiError::NotFound),
        ResourceState::Deleted => return Err(ApiError::Gone),
    };

    let requested = requested_props(&body);

    let mut children = Vec::new();
    if resource.is_container() && depth(ctx) != "0" {
        for quad in resource.graph(&graphs::CONTAINMENT) {
            if let Term::Iri(child_id) = &quad.object {
                let child_external = trellis_rdf::identifier::to_external(child_id, base_url);
                if let ResourceState::Present(child) = ctx.state.repository.get(child_id.as_str()).await? {
                    children.push((child_external.as_str().to_string(), child));
                }
            }
        }
    }

    let mut writer = Writer::new(Vec::new());
    writer
        .create_element("multistatus")
        .with_attribute(("xmlns", DAV_NS))
        .write_inner_content::<_, quick_xml::Error>(|writer| {
            write_response(writer, &external, &resource, base_url, requested.as_deref())?;
            for (child_external, child) in &children {
                write_response(writer, child_external, child, base_url, requested.as_deref())?;
            }
            Ok(())
        })
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let body = String::from_utf8(writer.into_inner()).map_err(|e| ApiError::Internal(e.into()))?;
    Ok(multistatus(body))
}

fn write_response(
    writer: &mut Writer<Vec<u8>>,
    external: &str,
    resource: &trellis_rdf::Resource,
    base_url: &str,
    requested: Option<&[(String, String)]>,
) -> Result<(), quick_xml::Error> {
    writer.create_element("response").write_inner_content::<_, quick_xml::Error>(|writer| {
        writer.create_element("href").write_text_content(BytesText::new(external))?;
        writer.create_element("propstat").write_inner_content::<_, quick_xml::Error>(|writer| {
            writer.create_element("prop").write_inner_content::<_, quick_xml::Error>(|writer| {
                let mut emitted: Vec<(String, String)> = Vec::new();
                for (ns, name, value) in synthetic_properties(resource, external) {
                    if requested.map(|props| props.iter().any(|(pns, pname)| pns == &ns && pname == &name)).unwrap_or(true) {
                        write_prop(writer, &ns, &name, &value)?;
                        emitted.push((ns, name));
                    }
                }
                let user_quads = common::quads_to_external(resource.graph(&graphs::USER_MANAGED), base_url);
                for quad in &user_quads {
                    let (ns, name) = predicate_to_qname(&quad.predicate);
                    if requested.map(|props| props.iter().any(|(pns, pname)| *pns == ns && *pname == name)).unwrap_or(true)
                        && !emitted.contains(&(ns.clone(), name.clone()))
                    {
                        write_prop(writer, &ns, &name, &quad.object.to_string())?;
                    }
                }
                Ok(())
            })?;
            writer.create_element("status").write_text_content(BytesText::new("HTTP/1.1 200 OK"))?;
            Ok(())
        })?;
        Ok(())
    })?;
    Ok(())
}

fn write_prop(writer: &mut Writer<Vec<u8>>, namespace: &str, name: &str, value: &str) -> Result<(), quick_xml::Error> {
    if namespace == DAV_NS {
        writer.create_element(name).write_text_content(BytesText::new(value))?;
    } else {
        let mut start = BytesStart::new(name);
        start.push_attribute(("xmlns", namespace));
        writer.write_event(Event::Start(start))?;
        writer.write_event(Event::Text(BytesText::new(value)))?;
        writer.write_event(Event::End(quick_xml::events::BytesEnd::new(name)))?;
    }
    Ok(())
}

/// Parses a `PROPFIND` request body's `<prop>` children into
/// `(namespace, local-name)` pairs. `None` (an empty body, or `<allprop/>`)
/// means "every known property".
fn requested_props(body: &[u8]) -> Option<Vec<(String, String)>> {
    if body.is_empty() {
        return None;
    }
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);
    let mut props = Vec::new();
    let mut in_prop = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let local = local_name_of(e.name());
                if local == "allprop" {
                    return None;
                }
                if local == "prop" {
                    in_prop = true;
                } else if in_prop {
                    props.push((DAV_NS.to_string(), local));
                }
            }
            Ok(Event::Empty(e)) => {
                let local = local_name_of(e.name());
                if local == "allprop" {
                    return None;
                }
                if in_prop {
                    props.push((DAV_NS.to_string(), local));
                }
            }
            Ok(Event::End(e)) => {
                if local_name_of(e.name()) == "prop" {
                    in_prop = false;
                }
            }
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    if props.is_empty() {
        None
    } else {
        Some(props)
    }
}

fn local_name_of(name: QName) -> String {
    String::from_utf8_lossy(name.local_name().as_ref()).to_string()
}

/// `PROPPATCH`: `<set>` children become user-managed quads, `<remove>`
/// children delete them by predicate, via a SPARQL-Update-equivalent overwrite
/// of the user-managed graph (spec.md §4.8).
pub async fn proppatch(ctx: &RequestContext, body: Bytes) -> Result<Response, ApiError> {
    let base_url = &ctx.state.config.base_url;
    let id = common::internal_id(base_url, &ctx.path);
    let external = common::external_uri(base_url, &ctx.path);

    authorize(ctx.state.webac.as_ref(), &ctx.state.config, &id, ctx.agent.as_ref(), "PROPPATCH", false).await?;

    let existing = ctx.state.repository.get(id.as_str()).await?;
    let resource = existing.as_present().ok_or(ApiError::NotFound)?.clone();

    let (sets, removes) = parse_propertyupdate(&body)?;

    let mut user_quads = resource.graph(&graphs::USER_MANAGED).to_vec();
    for (namespace, name, _value) in &removes {
        let predicate = qname_to_predicate(namespace, name);
        user_quads.retain(|q| q.predicate != predicate);
    }
    for (namespace, name, value) in &sets {
        let predicate = qname_to_predicate(namespace, name);
        user_quads.retain(|q| q.predicate != predicate);
        user_quads.push(Quad::new(
            graphs::USER_MANAGED.clone(),
            NamedOrBlank::Iri(Iri::new(external.clone())),
            predicate,
            Term::Literal(Literal::plain(value.clone())),
        ));
    }
    let internal_quads = common::quads_to_internal(user_quads, base_url);

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
    ctx.state.repository.replace(meta, internal_quads, Some(resource.modified)).await?;
    ctx.state.repository.add(id.as_str(), &[super::ldp::write::audit_quad(&id, "update")]).await;

    let mut writer = Writer::new(Vec::new());
    writer
        .create_element("multistatus")
        .with_attribute(("xmlns", DAV_NS))
        .write_inner_content::<_, quick_xml::Error>(|writer| {
            writer.create_element("response").write_inner_content::<_, quick_xml::Error>(|writer| {
                writer.create_element("href").write_text_content(BytesText::new(&external))?;
                writer.create_element("propstat").write_inner_content::<_, quick_xml::Error>(|writer| {
                    writer.create_element("prop").write_inner_content::<_, quick_xml::Error>(|writer| {
                        for (namespace, name, _) in sets.iter().chain(removes.iter()) {
                            write_prop(writer, namespace, name, "")?;
                        }
                        Ok(())
                    })?;
                    writer.create_element("status").write_text_content(BytesText::new("HTTP/1.1 200 OK"))?;
                    Ok(())
                })?;
                Ok(())
            })?;
            Ok(())
        })
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let body = String::from_utf8(writer.into_inner()).map_err(|e| ApiError::Internal(e.into()))?;
    Ok(multistatus(body))
}

type PropEdits = Vec<(String, String, String)>;

/// Parses a `<propertyupdate>` body into its `<set>` and `<remove>` property
/// lists, each `(namespace, local-name, text-content)`.
fn parse_propertyupdate(body: &[u8]) -> Result<(PropEdits, PropEdits), ApiError> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);
    let mut sets = Vec::new();
    let mut removes = Vec::new();
    let mut mode: Option<bool> = None; // Some(true) = set, Some(false) = remove
    let mut in_prop = false;
    let mut current: Option<(String, String)> = None;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(|e| ApiError::BadRequest(e.to_string()))? {
            Event::Eof => break,
            Event::Start(e) => {
                let local = local_name_of(e.name());
                match local.as_str() {
                    "set" => mode = Some(true),
                    "remove" => mode = Some(false),
                    "prop" => in_prop = true,
                    _ if in_prop && current.is_none() => {
                        let ns = e
                            .attributes()
                            .flatten()
                            .find(|a| a.key.as_ref() == b"xmlns")
                            .map(|a| String::from_utf8_lossy(&a.value).to_string())
                            .unwrap_or_else(|| DAV_NS.to_string());
                        current = Some((ns, local));
                    }
                    _ => {}
                }
            }
            Event::Text(text) => {
                if let Some((ns, name)) = &current {
                    let value = text.unescape().unwrap_or_default().to_string();
                    match mode {
                        Some(true) => sets.push((ns.clone(), name.clone(), value)),
                        Some(false) => removes.push((ns.clone(), name.clone(), value)),
                        None => {}
                    }
                }
            }
            Event::Empty(e) => {
                let local = local_name_of(e.name());
                if in_prop {
                    let ns = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == b"xmlns")
                        .map(|a| String::from_utf8_lossy(&a.value).to_string())
                        .unwrap_or_else(|| DAV_NS.to_string());
                    match mode {
                        Some(true) => sets.push((ns, local, String::new())),
                        Some(false) => removes.push((ns, local, String::new())),
                        None => {}
                    }
                }
            }
            Event::End(e) => {
                let local = local_name_of(e.name());
                match local.as_str() {
                    "set" | "remove" => mode = None,
                    "prop" => in_prop = false,
                    _ if current.as_ref().map(|(_, n)| n == &local).unwrap_or(false) => current = None,
                    _ => {}
                }
            }
            _ => {}
        }
        buf.clear();
    }
    Ok((sets, removes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qname_predicate_round_trips_through_hash_namespaces() {
        let predicate = qname_to_predicate("http://purl.org/dc/terms/", "title");
        assert_eq!(predicate.as_str(), "http://purl.org/dc/terms/title");
        let (ns, name) = predicate_to_qname(&predicate);
        assert_eq!(ns, "http://purl.org/dc/terms/");
        assert_eq!(name, "title");
    }

    #[test]
    fn allprop_request_requests_every_property() {
        assert!(requested_props(b"<propfind xmlns=\"DAV:\"><allprop/></propfind>").is_none());
        assert!(requested_props(b"").is_none());
    }

    #[test]
    fn named_props_are_extracted_from_prop_element() {
        let body = b"<propfind xmlns=\"DAV:\"><prop><getcontenttype/><resourcetype/></prop></propfind>";
        let props = requested_props(body).unwrap();
        assert!(props.iter().any(|(_, n)| n == "getcontenttype"));
        assert!(props.iter().any(|(_, n)| n == "resourcetype"));
    }

    #[test]
    fn propertyupdate_splits_set_and_remove() {
        let body = b"<propertyupdate xmlns=\"DAV:\"><set><prop><displayname>new title</displayname></prop></set><remove><prop><getetag/></prop></remove></propertyupdate>";
        let (sets, removes) = parse_propertyupdate(body).unwrap();
        assert_eq!(sets, vec![(DAV_NS.to_string(), "displayname".to_string(), "new title".to_string())]);
        assert_eq!(removes, vec![(DAV_NS.to_string(), "getetag".to_string(), String::new())]);
    }
}
