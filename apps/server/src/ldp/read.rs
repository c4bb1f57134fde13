//! GET/HEAD/OPTIONS (spec.md §4.1 "Read path", §4.2 Memento, §4.5 negotiation).

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use trellis_rdf::quad::vocab;
use trellis_rdf::ResourceState;
use trellis_storage::{BinaryStore, DigestAlgorithm, MementoRange};

use super::common;
use super::RequestContext;
use crate::authz::authorize;
use crate::conditional::{self, ConditionalOutcome};
use crate::error::ApiError;
use crate::memento;
use crate::negotiation;
use crate::prefer;

pub async fn get_or_head(ctx: &RequestContext, include_body: bool) -> Result<Response, ApiError> {
    let base_url = &ctx.state.config.base_url;
    let id = common::internal_id(base_url, &ctx.path);
    let external = common::external_uri(base_url, &ctx.path);

    authorize(
        ctx.state.webac.as_ref(),
        &ctx.state.config,
        &id,
        ctx.agent.as_ref(),
        ctx.method.as_str(),
        ctx.query.get("ext").map(String::as_str) == Some("acl"),
    )
    .await?;

    if ctx.query.get("ext").map(String::as_str) == Some("timemap") {
        return render_timemap(ctx, &id, &external).await;
    }

    let instant = if let Some(version) = ctx.query.get("version") {
        let secs: i64 = version.parse().map_err(|_| ApiError::BadRequest("invalid version".to_string()))?;
        Some(trellis_rdf::Instant::from_epoch_seconds(secs))
    } else if ctx.headers.get("accept-datetime").is_some() {
        Some(memento::parse_accept_datetime(ctx.headers.get("accept-datetime").and_then(|v| v.to_str().ok())))
    } else {
        None
    };

    let state = match instant {
        Some(instant) => ctx.state.repository.get_at(id.as_str(), instant).await?,
        None => ctx.state.repository.get(id.as_str()).await?,
    };

    let resource = match state {
        // A TimeGate query (`Accept-Datetime` / `?version=`) whose instant precedes
        // every snapshot is a TimeGate miss, not an absent resource (spec.md §4.4
        // "on absence it replies 406 Not Acceptable", §7, §8 scenario 3).
        ResourceState::Missing if instant.is_some() => return Err(ApiError::NotAcceptable),
        ResourceState::Missing => return Err(ApiError::NotFound),
        ResourceState::Deleted => return Err(ApiError::Gone),
        ResourceState::Present(resource) => resource,
    };

    let memento_ranges = if ctx.state.config.memento_header_dates {
        ctx.state.repository.list_versions(id.as_str()).await?
    } else {
        Vec::new()
    };

    if resource.is_non_rdf_source() {
        return binary_response(ctx, &resource, &external, include_body, &memento_ranges).await;
    }

    let etag = conditional::rdf_etag(resource.modified, ctx.state.config.weak_etag);
    match conditional::check_preconditions(&ctx.headers, &etag, true) {
        ConditionalOutcome::NotModified => {
            let mut response = StatusCode::NOT_MODIFIED.into_response();
            insert_etag(&mut response, &etag);
            return Ok(response);
        }
        ConditionalOutcome::PreconditionFailed => return Err(ApiError::PreconditionFailed),
        ConditionalOutcome::Proceed => {}
    }

    let selection = prefer::select_graphs(
        ctx.headers.get(header::PREFER).and_then(|v| v.to_str().ok()),
        ctx.query.get("ext").map(String::as_str),
    );
    let quads: Vec<_> = resource.stream(&selection.graphs).cloned().collect();
    let external_quads = common::quads_to_external(&quads, base_url);

    let accept = ctx.headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());
    let syntax = negotiation::negotiate_syntax(accept).ok_or(ApiError::NotAcceptable)?;
    let profile = negotiation::negotiate_jsonld_profile(accept);
    let prefixes = ctx.state.namespaces.all();
    let (body, media_type) = common::write_body(&external_quads, syntax, profile, &prefixes);

    let mut response = if include_body { (StatusCode::OK, body).into_response() } else { StatusCode::OK.into_response() };
    response.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static(media_type));
    insert_etag(&mut response, &etag);
    insert_common_headers(&mut response, &resource, &external, &memento_ranges);
    if let Some(applied) = selection.preference_applied {
        if let Ok(value) = HeaderValue::from_str(&format!("{applied}")) {
            response.headers_mut().insert("preference-applied", value);
        }
    }
    Ok(response)
}

async fn binary_response(
    ctx: &RequestContext,
    resource: &trellis_rdf::Resource,
    external: &str,
    include_body: bool,
    memento_ranges: &[MementoRange],
) -> Result<Response, ApiError> {
    let binary = resource.binary.as_ref().ok_or(ApiError::NotFound)?;
    let sha256 = ctx
        .state
        .binaries
        .digest(&binary.id, Some(DigestAlgorithm::Sha256))
        .await?
        .unwrap_or_default();
    let etag = conditional::binary_etag(&sha256);

    match conditional::check_preconditions(&ctx.headers, &etag, true) {
        ConditionalOutcome::NotModified => {
            let mut response = StatusCode::NOT_MODIFIED.into_response();
            insert_etag(&mut response, &etag);
            return Ok(response);
        }
        ConditionalOutcome::PreconditionFailed => return Err(ApiError::PreconditionFailed),
        ConditionalOutcome::Proceed => {}
    }

    let range = ctx.headers.get(header::RANGE).and_then(|v| v.to_str().ok()).and_then(parse_range);

    let mut response = if include_body {
        let stream = match range {
            Some((from, to)) => ctx.state.binaries.get_range(&binary.id, from, to).await?,
            None => ctx.state.binaries.get(&binary.id).await?,
        };
        let body = axum::body::Body::from_stream(stream);
        let status = if range.is_some() { StatusCode::PARTIAL_CONTENT } else { StatusCode::OK };
        (status, body).into_response()
    } else {
        StatusCode::OK.into_response()
    };

    if let Some(mime) = &binary.mime_type {
        if let Ok(value) = HeaderValue::from_str(mime) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
    }
    if let Some(size) = binary.size {
        if let Ok(value) = HeaderValue::from_str(&size.to_string()) {
            response.headers_mut().insert(header::CONTENT_LENGTH, value);
        }
    }
    response.headers_mut().insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    insert_etag(&mut response, &etag);
    insert_common_headers(&mut response, resource, external, memento_ranges);

    if let Some(want) = ctx.headers.get("want-digest").and_then(|v| v.to_str().ok()) {
        if let Some(algorithm) = negotiate_digest_algorithm(want) {
            if let Some(digest) = ctx.state.binaries.digest(&binary.id, Some(algorithm)).await? {
                if let Ok(value) = HeaderValue::from_str(&format!("{}={digest}", algorithm.header_name())) {
                    response.headers_mut().insert("digest", value);
                }
            }
        }
    }

    Ok(response)
}

fn negotiate_digest_algorithm(want_digest: &str) -> Option<DigestAlgorithm> {
    want_digest
        .split(',')
        .filter_map(|entry| {
            let name = entry.split(';').next()?.trim();
            DigestAlgorithm::parse(name)
        })
        .next()
}

/// `Range: bytes=<from>-<to>`, single contiguous range only; anything else is
/// ignored and the full object is served (spec.md §4.2 "Range requests").
fn parse_range(header: &str) -> Option<(u64, u64)> {
    let spec = header.strip_prefix("bytes=")?;
    if spec.contains(',') {
        return None;
    }
    let (from, to) = spec.split_once('-')?;
    let from: u64 = from.parse().ok()?;
    let to: u64 = if to.is_empty() { u64::MAX } else { to.parse::<u64>().ok()? + 1 };
    if to <= from {
        return None;
    }
    Some((from, to))
}

fn insert_etag(response: &mut Response, etag: &str) {
    if let Ok(value) = HeaderValue::from_str(etag) {
        response.headers_mut().insert(header::ETAG, value);
    }
}

fn insert_common_headers(
    response: &mut Response,
    resource: &trellis_rdf::Resource,
    external: &str,
    memento_ranges: &[MementoRange],
) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&format!("<{}>; rel=\"type\"", resource.interaction_model)) {
        headers.append(header::LINK, value);
    }
    for link in memento::link_headers(external) {
        if let Ok(value) = HeaderValue::from_str(&link) {
            headers.append(header::LINK, value);
        }
    }
    // One `rel="memento"; datetime="…"` per snapshot (spec.md §4.7 "Memento
    // exposure"), gated on `trellis.http.memento-header-dates`.
    for link in memento::memento_links(external, memento_ranges) {
        if let Ok(value) = HeaderValue::from_str(&link) {
            headers.append(header::LINK, value);
        }
    }
    let allow = common::allowed_methods(resource.is_container(), resource.is_non_rdf_source());
    if let Ok(value) = HeaderValue::from_str(allow) {
        headers.insert(header::ALLOW, value);
    }
    if resource.is_container() {
        if let Ok(value) = HeaderValue::from_str(&format!(
            "<{}>, <{}>, <{}>",
            vocab::LDP_RDF_SOURCE.as_str(),
            vocab::LDP_NON_RDF_SOURCE.as_str(),
            vocab::LDP_CONTAINER.as_str()
        )) {
            headers.insert("accept-post", value);
        }
    }
}

async fn render_timemap(ctx: &RequestContext, id: &trellis_rdf::Iri, external: &str) -> Result<Response, ApiError> {
    let ranges = ctx.state.repository.list_versions(id.as_str()).await?;
    let body = memento::render_timemap(external, &ranges);
    let mut response = (StatusCode::OK, body).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/link-format"));
    Ok(response)
}

pub async fn options(ctx: &RequestContext) -> Result<Response, ApiError> {
    let base_url = &ctx.state.config.base_url;
    let id = common::internal_id(base_url, &ctx.path);
    let state = ctx.state.repository.get(id.as_str()).await?;
    let mut response = StatusCode::NO_CONTENT.into_response();
    match state {
        ResourceState::Present(resource) => {
            let allow = common::allowed_methods(resource.is_container(), resource.is_non_rdf_source());
            if let Ok(value) = HeaderValue::from_str(allow) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        _ => {
            if let Ok(value) = HeaderValue::from_str("GET, HEAD, OPTIONS, PUT") {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
    }
    Ok(response)
}
