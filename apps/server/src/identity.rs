//! Principal extraction from the `Authorization` header (spec.md §4.6 treats
//! agent identity as an opaque IRI supplied by an upstream authentication
//! layer; this crate accepts HTTP Basic as the one concrete binding so the
//! WebAC engine always has something to evaluate against).

use axum::http::HeaderMap;
use base64::Engine;
use trellis_rdf::Iri;

/// `None` means the anonymous agent; WebAC still evaluates `foaf:Agent` and
/// `acl:AuthenticatedAgent` rules against it.
pub fn extract_agent(headers: &HeaderMap) -> Option<Iri> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD.decode(encoded).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (username, _password) = text.split_once(':')?;
    if username.is_empty() {
        return None;
    }
    Some(Iri::new(format!("urn:trellis:user:{username}")))
}

pub fn is_admin(agent: Option<&Iri>, admin_users: &[String]) -> bool {
    let Some(agent) = agent else { return false };
    admin_users.iter().any(|candidate| agent.as_str().ends_with(candidate.as_str()))
}
