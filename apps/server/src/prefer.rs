//! `Prefer` header and `ext=` query-parameter handling (spec.md §6, §4.2): both
//! select which named graphs a representation includes.

use trellis_rdf::quad::graphs;
use trellis_rdf::Iri;

/// A resolved graph selection plus the `Preference-Applied` value the response
/// should echo back, if any.
pub struct GraphSelection {
    pub graphs: Vec<Iri>,
    pub preference_applied: Option<&'static str>,
}

fn all_known_graphs() -> Vec<Iri> {
    vec![
        graphs::USER_MANAGED.clone(),
        graphs::SERVER_MANAGED.clone(),
        graphs::CONTAINMENT.clone(),
        graphs::MEMBERSHIP.clone(),
        graphs::ACCESS_CONTROL.clone(),
        graphs::AUDIT.clone(),
    ]
}

/// Parses a `Prefer: return=representation; include="..."; omit="..."` header
/// value, falling back to `graphs::default_included()` when absent or when it
/// does not ask for `return=minimal`/explicit includes.
pub fn select_graphs(prefer_header: Option<&str>, ext: Option<&str>) -> GraphSelection {
    if let Some(ext) = ext {
        return select_by_ext(ext);
    }

    let Some(header) = prefer_header else {
        return GraphSelection { graphs: graphs::default_included(), preference_applied: None };
    };

    if header.contains("return=minimal") {
        return GraphSelection { graphs: vec![], preference_applied: Some("return=minimal") };
    }

    let include = extract_quoted_param(header, "include");
    let omit = extract_quoted_param(header, "omit");

    if include.is_none() && omit.is_none() {
        return GraphSelection { graphs: graphs::default_included(), preference_applied: None };
    }

    let mut selected = graphs::default_included();
    if let Some(include_uris) = &include {
        for uri in include_uris {
            if let Some(graph) = graph_for_uri(uri) {
                if !selected.contains(&graph) {
                    selected.push(graph);
                }
            }
        }
    }
    if let Some(omit_uris) = &omit {
        selected.retain(|graph| !omit_uris.iter().any(|uri| graph_for_uri(uri).as_ref() == Some(graph)));
    }

    GraphSelection { graphs: selected, preference_applied: Some("return=representation") }
}

/// `?ext=acl` and `?ext=timemap` are the two non-Prefer extension selectors
/// this server recognizes (spec.md §6 "Memento" / WebAC sections).
fn select_by_ext(ext: &str) -> GraphSelection {
    match ext {
        "acl" => GraphSelection { graphs: vec![graphs::ACCESS_CONTROL.clone()], preference_applied: None },
        "audit" => GraphSelection { graphs: vec![graphs::AUDIT.clone()], preference_applied: None },
        _ => GraphSelection { graphs: graphs::default_included(), preference_applied: None },
    }
}

fn extract_quoted_param<'a>(header: &'a str, name: &str) -> Option<Vec<&'a str>> {
    let needle = format!("{name}=\"");
    let start = header.find(&needle)? + needle.len();
    let rest = &header[start..];
    let end = rest.find('"')?;
    Some(rest[..end].split_whitespace().collect())
}

fn graph_for_uri(uri: &str) -> Option<Iri> {
    all_known_graphs().into_iter().find(|graph| graph.as_str() == uri)
}
