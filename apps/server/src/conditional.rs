//! ETag computation and conditional-request evaluation (spec.md §4.2, §6
//! `http.weak-etag` / `http.precondition-required`).
//!
//! An RDF source's ETag is derived from its `modified` instant (weak by
//! default, since two requests issued in the same wall-clock state always
//! serialize the same quads). A binary's ETag is its SHA-256 digest,
//! per SPEC_FULL.md §B's resolution of the "strong ETag algorithm" open
//! question -- content-addressed and independent of `modified`.

use axum::http::HeaderMap;
use trellis_rdf::Instant;

pub fn rdf_etag(modified: Instant, weak: bool) -> String {
    let value = format!("\"{}\"", modified.epoch_seconds());
    if weak {
        format!("W/{value}")
    } else {
        value
    }
}

/// `sha256_digest` is the binary store's own `digest(id, Some(Sha256))` result
/// -- reusing C3's digest path rather than re-reading the object here.
pub fn binary_etag(sha256_digest: &str) -> String {
    format!("\"{sha256_digest}\"")
}

/// Strips a leading `W/` for comparison purposes -- RFC 7232 weak comparison
/// treats `W/"x"` and `"x"` as equivalent everywhere except `If-Match` wants
/// strong comparison for unsafe methods carrying a body; this server applies
/// weak comparison uniformly, matching `http.weak-etag`'s default.
fn strip_weak_prefix(etag: &str) -> &str {
    etag.strip_prefix("W/").unwrap_or(etag)
}

fn etag_matches(candidate: &str, current: &str) -> bool {
    strip_weak_prefix(candidate.trim()) == strip_weak_prefix(current)
}

pub enum ConditionalOutcome {
    Proceed,
    NotModified,
    PreconditionFailed,
}

/// Evaluates `If-Match` / `If-None-Match` against `current_etag`. `is_safe`
/// distinguishes GET/HEAD (where `If-None-Match` match yields 304) from
/// mutating methods (where it yields 412, spec.md §7).
pub fn check_preconditions(headers: &HeaderMap, current_etag: &str, is_safe: bool) -> ConditionalOutcome {
    if let Some(if_match) = headers.get(axum::http::header::IF_MATCH).and_then(|v| v.to_str().ok()) {
        if if_match.trim() != "*" && !if_match.split(',').any(|candidate| etag_matches(candidate, current_etag)) {
            return ConditionalOutcome::PreconditionFailed;
        }
    }

    if let Some(if_none_match) = headers.get(axum::http::header::IF_NONE_MATCH).and_then(|v| v.to_str().ok()) {
        let matched = if_none_match.trim() == "*"
            || if_none_match.split(',').any(|candidate| etag_matches(candidate, current_etag));
        if matched {
            return if is_safe { ConditionalOutcome::NotModified } else { ConditionalOutcome::PreconditionFailed };
        }
    }

    ConditionalOutcome::Proceed
}

/// spec.md §6 `http.precondition-required`: when set, unsafe methods without
/// an `If-Match` header are rejected with 428 rather than proceeding blind.
pub fn requires_precondition(headers: &HeaderMap, precondition_required: bool, is_safe: bool) -> bool {
    !is_safe && precondition_required && headers.get(axum::http::header::IF_MATCH).is_none()
}
