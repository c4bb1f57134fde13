//! C10: the LDP protocol handler. A single method dispatcher (spec.md §4.1)
//! fronts the read path (`read.rs`: GET/HEAD/OPTIONS) and the write path
//! (`write.rs`: POST/PUT/PATCH/DELETE); both share the translation and syntax
//! helpers in `common.rs`.

pub mod common;
pub mod read;
pub mod write;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Method, Request};
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::identity;
use crate::state::AppState;
use trellis_rdf::Iri;

/// Everything a handler needs, assembled once per request.
pub struct RequestContext {
    pub state: AppState,
    pub path: String,
    pub headers: HeaderMap,
    pub query: std::collections::HashMap<String, String>,
    pub agent: Option<Iri>,
    pub method: Method,
}

fn parse_query(raw: Option<&str>) -> std::collections::HashMap<String, String> {
    let Some(raw) = raw else { return Default::default() };
    raw.split('&')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?.to_string();
            let value = parts.next().unwrap_or("").to_string();
            Some((key, value))
        })
        .collect()
}

pub async fn dispatch(State(state): State<AppState>, req: Request<Body>) -> Response {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();
    let query = parse_query(parts.uri.query());
    let agent = identity::extract_agent(&parts.headers);
    let ctx = RequestContext { state, path, headers: parts.headers, query, agent, method: parts.method.clone() };

    let result = match parts.method.as_str() {
        "GET" => read::get_or_head(&ctx, true).await,
        "HEAD" => read::get_or_head(&ctx, false).await,
        "OPTIONS" => read::options(&ctx).await,
        "POST" => match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => write::post(&ctx, bytes).await,
            Err(err) => Err(ApiError::BadRequest(err.to_string())),
        },
        "PUT" => match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => write::put(&ctx, bytes).await,
            Err(err) => Err(ApiError::BadRequest(err.to_string())),
        },
        "PATCH" => match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => write::patch(&ctx, bytes).await,
            Err(err) => Err(ApiError::BadRequest(err.to_string())),
        },
        "DELETE" => write::delete(&ctx).await,
        "PROPFIND" => match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => crate::webdav::propfind(&ctx, bytes).await,
            Err(err) => Err(ApiError::BadRequest(err.to_string())),
        },
        "PROPPATCH" => match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => crate::webdav::proppatch(&ctx, bytes).await,
            Err(err) => Err(ApiError::BadRequest(err.to_string())),
        },
        "MKCOL" => crate::webdav::mkcol(&ctx).await,
        "COPY" => crate::webdav::copy(&ctx).await,
        "MOVE" => crate::webdav::r#move(&ctx).await,
        other => Err(ApiError::BadRequest(format!("unsupported method {other}"))),
    };

    match result {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}
