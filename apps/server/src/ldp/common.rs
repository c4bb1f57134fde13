//! Shared LDP request/response plumbing: internal/external translation,
//! syntax dispatch, and interaction-model detection (spec.md §4.1, §4.5).

use std::collections::HashMap;

use trellis_io::{read_jsonld, read_turtle, write_jsonld, write_turtle, IoResult, JsonLdProfile, RdfSyntax};
use trellis_rdf::identifier;
use trellis_rdf::quad::vocab;
use trellis_rdf::{Iri, NamedOrBlank, Quad, Term};

use crate::error::ApiError;

pub fn external_uri(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        format!("{base}/")
    } else {
        format!("{base}/{path}")
    }
}

pub fn internal_id(base_url: &str, path: &str) -> Iri {
    let external = Iri::new(external_uri(base_url, path));
    identifier::to_internal(&external, base_url)
}

fn translate_named_or_blank(value: &NamedOrBlank, base_url: &str, to_external: bool) -> NamedOrBlank {
    match value {
        NamedOrBlank::Iri(iri) => {
            let translated = if to_external { identifier::to_external(iri, base_url) } else { identifier::to_internal(iri, base_url) };
            NamedOrBlank::Iri(translated)
        }
        NamedOrBlank::Blank(b) => NamedOrBlank::Blank(b.clone()),
    }
}

fn translate_term(value: &Term, base_url: &str, to_external: bool) -> Term {
    match value {
        Term::Iri(iri) => {
            let translated = if to_external { identifier::to_external(iri, base_url) } else { identifier::to_internal(iri, base_url) };
            Term::Iri(translated)
        }
        other => other.clone(),
    }
}

fn translate_quad(quad: &Quad, base_url: &str, to_external: bool) -> Quad {
    let predicate = if to_external { identifier::to_external(&quad.predicate, base_url) } else { identifier::to_internal(&quad.predicate, base_url) };
    Quad::new(
        translate_named_or_blank(&quad.graph, base_url, to_external),
        translate_named_or_blank(&quad.subject, base_url, to_external),
        predicate,
        translate_term(&quad.object, base_url, to_external),
    )
}

pub fn quads_to_external(quads: &[Quad], base_url: &str) -> Vec<Quad> {
    quads.iter().map(|q| translate_quad(q, base_url, true)).collect()
}

pub fn quads_to_internal(quads: Vec<Quad>, base_url: &str) -> Vec<Quad> {
    quads.iter().map(|q| translate_quad(q, base_url, false)).collect()
}

/// Parses a request body of the given syntax into quads already placed in
/// `graph`, for the user-managed graph (the only graph a client ever writes
/// to directly).
pub fn parse_body(input: &str, syntax: RdfSyntax, graph: &Iri, base: &Iri) -> IoResult<Vec<Quad>> {
    match syntax {
        RdfSyntax::Turtle => read_turtle(input, graph, base),
        RdfSyntax::JsonLd => read_jsonld(input, graph),
        RdfSyntax::NTriples | RdfSyntax::NQuads => Ok(trellis_rdf::nquads::parse_nquads(input)
            .into_iter()
            .map(|quad| Quad::new(graph.clone(), quad.subject, quad.predicate, quad.object))
            .collect()),
        RdfSyntax::SparqlUpdate => Ok(Vec::new()),
    }
}

/// Serializes `quads` (already translated to external IRIs) into `syntax`,
/// returning the body and its media type.
pub fn write_body(
    quads: &[Quad],
    syntax: RdfSyntax,
    profile: JsonLdProfile,
    prefixes: &HashMap<String, String>,
) -> (String, &'static str) {
    match syntax {
        RdfSyntax::Turtle => (write_turtle(quads, prefixes), syntax.media_type()),
        RdfSyntax::NTriples => (write_turtle(quads, &HashMap::new()), syntax.media_type()),
        RdfSyntax::NQuads => (trellis_rdf::nquads::write_nquads(quads), syntax.media_type()),
        RdfSyntax::JsonLd => (write_jsonld(quads, profile, prefixes), syntax.media_type()),
        RdfSyntax::SparqlUpdate => (String::new(), syntax.media_type()),
    }
}

/// Maps an LDP `Link: <...>; rel="type"` request header to the interaction
/// model it requests, defaulting to a basic container for a container-typed
/// POST and an RDF source otherwise (spec.md §4.1 "Interaction models").
pub fn requested_interaction_model(link_header: Option<&str>) -> Iri {
    let Some(header) = link_header else { return vocab::LDP_RDF_SOURCE.clone() };
    for candidate in [
        &*vocab::LDP_INDIRECT_CONTAINER,
        &*vocab::LDP_DIRECT_CONTAINER,
        &*vocab::LDP_BASIC_CONTAINER,
        &*vocab::LDP_CONTAINER,
        &*vocab::LDP_NON_RDF_SOURCE,
        &*vocab::LDP_RDF_SOURCE,
    ] {
        if header.contains(candidate.as_str()) {
            return candidate.clone();
        }
    }
    vocab::LDP_RDF_SOURCE.clone()
}

pub fn is_container_model(model: &Iri) -> bool {
    [&*vocab::LDP_CONTAINER, &*vocab::LDP_BASIC_CONTAINER, &*vocab::LDP_DIRECT_CONTAINER, &*vocab::LDP_INDIRECT_CONTAINER]
        .iter()
        .any(|candidate| *candidate == model)
}

pub fn allowed_methods(is_container: bool, is_non_rdf: bool) -> &'static str {
    if is_non_rdf {
        "GET, HEAD, OPTIONS, PUT, DELETE"
    } else if is_container {
        "GET, HEAD, OPTIONS, POST, PUT, PATCH, DELETE"
    } else {
        "GET, HEAD, OPTIONS, PUT, PATCH, DELETE"
    }
}

pub fn bad_accept() -> ApiError {
    ApiError::NotAcceptable
}

/// Predicates that only ever belong to `PreferServerManaged`/`PreferContainment`
/// (spec.md §3), never to a client-writable graph. A PATCH whose INSERT/DELETE
/// template names one of these is attempting to forge server-managed state and
/// must be rejected (spec.md §4.7).
pub fn is_server_managed_predicate(predicate: &Iri) -> bool {
    [
        &*vocab::RDF_TYPE,
        &*vocab::DC_MODIFIED,
        &*vocab::DC_HAS_PART,
        &*vocab::DC_IS_PART_OF,
        &*vocab::DC_FORMAT,
        &*vocab::DC_EXTENT,
        &*vocab::LDP_CONTAINS,
        &*vocab::LDP_MEMBERSHIP_RESOURCE,
        &*vocab::LDP_HAS_MEMBER_RELATION,
        &*vocab::LDP_IS_MEMBER_OF_RELATION,
        &*vocab::LDP_INSERTED_CONTENT_RELATION,
    ]
    .iter()
    .any(|candidate| *candidate == predicate)
}
