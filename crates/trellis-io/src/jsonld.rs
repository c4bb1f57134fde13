//! A simplified JSON-LD reader/writer: flattened node-object arrays in, one of
//! three output profiles out (spec.md §4.5). Full JSON-LD algorithms (context
//! processing, IRI compaction against arbitrary remote contexts, framing) are out
//! of scope — this speaks the expanded/flattened subset a client that already
//! knows the vocabulary can round-trip, plus a light compaction pass driven by
//! the namespace service's own prefix table.

use crate::error::{IoError, IoResult};
use dashmap::DashMap;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use trellis_rdf::{BlankNode, Iri, Literal, LiteralKind, NamedOrBlank, Quad, Term};

/// Caches rendered JSON-LD documents keyed first by resource identifier, then by
/// profile — avoids re-running `group_nodes`/compaction on every repeated GET of
/// the same resource in the same profile (spec.md §4.5/§5).
#[derive(Default)]
pub struct ProfileCache {
    by_resource: DashMap<String, DashMap<JsonLdProfile, Arc<String>>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, resource: &str, profile: JsonLdProfile) -> Option<Arc<String>> {
        self.by_resource.get(resource)?.get(&profile).map(|entry| entry.clone())
    }

    pub fn put(&self, resource: &str, profile: JsonLdProfile, rendered: Arc<String>) {
        self.by_resource.entry(resource.to_string()).or_default().insert(profile, rendered);
    }

    pub fn invalidate(&self, resource: &str) {
        self.by_resource.remove(resource);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JsonLdProfile {
    Expanded,
    Compacted,
    Flattened,
}

impl JsonLdProfile {
    pub fn uri(self) -> &'static str {
        match self {
            Self::Expanded => "http://www.w3.org/ns/json-ld#expanded",
            Self::Compacted => "http://www.w3.org/ns/json-ld#compacted",
            Self::Flattened => "http://www.w3.org/ns/json-ld#flattened",
        }
    }

    /// Picks the first of `expanded`, `compacted`, `flattened` that appears in a
    /// `profile="..."` parameter value; defaults to `Compacted` when none match
    /// (spec.md §4.5 "profile negotiation").
    pub fn select(profile_param: &str) -> Self {
        for candidate in [Self::Flattened, Self::Expanded, Self::Compacted] {
            if profile_param.contains(candidate.uri()) {
                return candidate;
            }
        }
        Self::Compacted
    }
}

pub fn read_jsonld(input: &str, graph: &Iri) -> IoResult<Vec<Quad>> {
    let value: Value = serde_json::from_str(input)
        .map_err(|err| IoError::BadRdfSyntax { syntax: "json-ld", reason: err.to_string() })?;
    let nodes = match value {
        Value::Array(nodes) => nodes,
        Value::Object(mut obj) => match obj.remove("@graph") {
            Some(Value::Array(nodes)) => nodes,
            _ => vec![Value::Object(obj)],
        },
        other => return Err(IoError::BadRdfSyntax { syntax: "json-ld", reason: format!("unexpected top-level value: {other}") }),
    };

    let mut quads = Vec::new();
    for node in nodes {
        let Value::Object(node) = node else {
            return Err(IoError::BadRdfSyntax { syntax: "json-ld", reason: "node must be an object".into() });
        };
        let subject = match node.get("@id").and_then(Value::as_str) {
            Some(id) if id.starts_with("_:") => NamedOrBlank::Blank(BlankNode::new(id.trim_start_matches("_:"))),
            Some(id) => NamedOrBlank::Iri(Iri::new(id)),
            None => return Err(IoError::BadRdfSyntax { syntax: "json-ld", reason: "node missing @id".into() }),
        };
        for type_iri in types_of(&node) {
            quads.push(Quad::new(
                graph.clone(),
                subject.clone(),
                Iri::new("http://www.w3.org/1999/02/22-rdf-syntax-ns#type"),
                Term::Iri(type_iri),
            ));
        }
        for (key, value) in &node {
            if key == "@id" || key == "@type" {
                continue;
            }
            let predicate = Iri::new(key.as_str());
            let values = match value {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            };
            for item in values {
                let object = value_to_term(&item)?;
                quads.push(Quad::new(graph.clone(), subject.clone(), predicate.clone(), object));
            }
        }
    }
    Ok(quads)
}

fn types_of(node: &Map<String, Value>) -> Vec<Iri> {
    match node.get("@type") {
        Some(Value::String(t)) => vec![Iri::new(t.as_str())],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).map(Iri::new).collect(),
        _ => Vec::new(),
    }
}

fn value_to_term(value: &Value) -> IoResult<Term> {
    match value {
        Value::Object(obj) => {
            if let Some(id) = obj.get("@id").and_then(Value::as_str) {
                return Ok(if let Some(label) = id.strip_prefix("_:") {
                    Term::Blank(BlankNode::new(label))
                } else {
                    Term::Iri(Iri::new(id))
                });
            }
            let lexical = obj
                .get("@value")
                .ok_or_else(|| IoError::BadRdfSyntax { syntax: "json-ld", reason: "value object missing @value".into() })?;
            let lexical = scalar_to_lexical(lexical);
            if let Some(lang) = obj.get("@language").and_then(Value::as_str) {
                return Ok(Term::Literal(Literal::lang(lexical, lang)));
            }
            if let Some(datatype) = obj.get("@type").and_then(Value::as_str) {
                return Ok(Term::Literal(Literal::typed(lexical, Iri::new(datatype))));
            }
            Ok(Term::Literal(Literal::plain(lexical)))
        }
        other => Ok(Term::Literal(Literal::plain(scalar_to_lexical(other)))),
    }
}

fn scalar_to_lexical(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Groups a flat quad set into node objects, keyed by subject, in expanded form.
/// Quads naming the same subject twice keep only the first-occurrence value for
/// any (predicate, value) pair already recorded — the "pick by first occurrence"
/// merge rule.
fn group_nodes(quads: &[Quad]) -> Vec<Value> {
    let mut order: Vec<String> = Vec::new();
    let mut nodes: HashMap<String, Map<String, Value>> = HashMap::new();

    for quad in quads {
        let subject_id = subject_id_string(&quad.subject);
        let node = nodes.entry(subject_id.clone()).or_insert_with(|| {
            order.push(subject_id.clone());
            let mut m = Map::new();
            m.insert("@id".to_string(), json!(subject_id));
            m
        });

        if quad.predicate.as_str() == "http://www.w3.org/1999/02/22-rdf-syntax-ns#type" {
            if let Term::Iri(type_iri) = &quad.object {
                let types = node.entry("@type").or_insert_with(|| json!([]));
                push_unique(types, json!(type_iri.as_str()));
                continue;
            }
        }

        let value = term_to_value(&quad.object);
        let values = node.entry(quad.predicate.as_str().to_string()).or_insert_with(|| json!([]));
        push_unique(values, value);
    }

    order.into_iter().map(|id| Value::Object(nodes.remove(&id).unwrap())).collect()
}

fn push_unique(array: &mut Value, value: Value) {
    let Value::Array(items) = array else { return };
    if !items.contains(&value) {
        items.push(value);
    }
}

fn subject_id_string(subject: &NamedOrBlank) -> String {
    match subject {
        NamedOrBlank::Iri(iri) => iri.as_str().to_string(),
        NamedOrBlank::Blank(b) => format!("_:{}", b.label()),
    }
}

fn term_to_value(term: &Term) -> Value {
    match term {
        Term::Iri(iri) => json!({ "@id": iri.as_str() }),
        Term::Blank(b) => json!({ "@id": format!("_:{}", b.label()) }),
        Term::Literal(lit) => match &lit.kind {
            LiteralKind::Plain => json!({ "@value": &*lit.lexical }),
            LiteralKind::Lang(lang) => json!({ "@value": &*lit.lexical, "@language": &**lang }),
            LiteralKind::Typed(dt) => json!({ "@value": &*lit.lexical, "@type": dt.as_str() }),
        },
    }
}

/// Writes `quads` in the requested profile. `prefixes` drives IRI compaction for
/// the `Compacted` profile only; `Expanded` and `Flattened` always use full IRIs.
pub fn write_jsonld(quads: &[Quad], profile: JsonLdProfile, prefixes: &HashMap<String, String>) -> String {
    let nodes = group_nodes(quads);
    match profile {
        JsonLdProfile::Expanded => serde_json::to_string_pretty(&Value::Array(nodes)).unwrap_or_default(),
        JsonLdProfile::Flattened => {
            let doc = json!({ "@graph": nodes });
            serde_json::to_string_pretty(&doc).unwrap_or_default()
        }
        JsonLdProfile::Compacted => {
            let compacted = compact_nodes(nodes, prefixes);
            let mut context = Map::new();
            for (prefix, namespace) in prefixes {
                context.insert(prefix.clone(), json!(namespace));
            }
            let doc = if compacted.len() == 1 {
                let mut obj = compacted.into_iter().next().unwrap();
                if let Value::Object(ref mut map) = obj {
                    map.insert("@context".to_string(), Value::Object(context));
                }
                obj
            } else {
                json!({ "@context": context, "@graph": compacted })
            };
            serde_json::to_string_pretty(&doc).unwrap_or_default()
        }
    }
}

fn compact_nodes(nodes: Vec<Value>, prefixes: &HashMap<String, String>) -> Vec<Value> {
    nodes
        .into_iter()
        .map(|node| {
            let Value::Object(map) = node else { return node };
            let mut compacted = Map::new();
            for (key, value) in map {
                let compacted_key = compact_iri(&key, prefixes);
                compacted.insert(compacted_key, value);
            }
            Value::Object(compacted)
        })
        .collect()
}

fn compact_iri(iri: &str, prefixes: &HashMap<String, String>) -> String {
    if iri == "@id" || iri == "@type" {
        return iri.to_string();
    }
    for (prefix, namespace) in prefixes {
        if let Some(local) = iri.strip_prefix(namespace.as_str()) {
            if !local.is_empty() {
                return format!("{prefix}:{local}");
            }
        }
    }
    iri.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_rdf::quad::graphs;

    #[test]
    fn reads_a_flattened_node_array() {
        let input = r#"[{"@id":"http://example.org/res1","http://purl.org/dc/terms/title":[{"@value":"Hello"}]}]"#;
        let graph = graphs::USER_MANAGED.clone();
        let quads = read_jsonld(input, &graph).unwrap();
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].predicate, Iri::new("http://purl.org/dc/terms/title"));
    }

    #[test]
    fn reads_rdf_type_from_at_type() {
        let input = r#"[{"@id":"http://example.org/res1","@type":["http://www.w3.org/ns/ldp#RDFSource"]}]"#;
        let graph = graphs::SERVER_MANAGED.clone();
        let quads = read_jsonld(input, &graph).unwrap();
        assert_eq!(quads[0].predicate.as_str(), "http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
    }

    #[test]
    fn profile_selection_defaults_to_compacted() {
        assert_eq!(JsonLdProfile::select("something-else"), JsonLdProfile::Compacted);
        assert_eq!(JsonLdProfile::select("http://www.w3.org/ns/json-ld#expanded"), JsonLdProfile::Expanded);
    }

    #[test]
    fn write_then_read_round_trips_in_expanded_profile() {
        let graph = graphs::USER_MANAGED.clone();
        let quads = vec![Quad::new(
            graph.clone(),
            Iri::new("http://example.org/res1"),
            Iri::new("http://purl.org/dc/terms/title"),
            Term::Literal(Literal::plain("Hello")),
        )];
        let serialized = write_jsonld(&quads, JsonLdProfile::Expanded, &HashMap::new());
        let reparsed = read_jsonld(&serialized, &graph).unwrap();
        assert_eq!(reparsed, quads);
    }

    #[test]
    fn profile_cache_remembers_per_resource_per_profile() {
        let cache = ProfileCache::new();
        assert!(cache.get("trellis:data/res1", JsonLdProfile::Expanded).is_none());
        cache.put("trellis:data/res1", JsonLdProfile::Expanded, Arc::new("[]".to_string()));
        assert_eq!(cache.get("trellis:data/res1", JsonLdProfile::Expanded).as_deref(), Some(&"[]".to_string()));
        assert!(cache.get("trellis:data/res1", JsonLdProfile::Compacted).is_none());
        cache.invalidate("trellis:data/res1");
        assert!(cache.get("trellis:data/res1", JsonLdProfile::Expanded).is_none());
    }

    #[test]
    fn compacted_profile_shortens_iris_using_prefixes() {
        let graph = graphs::USER_MANAGED.clone();
        let quads = vec![Quad::new(
            graph,
            Iri::new("http://example.org/res1"),
            Iri::new("http://purl.org/dc/terms/title"),
            Term::Literal(Literal::plain("Hello")),
        )];
        let mut prefixes = HashMap::new();
        prefixes.insert("dc".to_string(), "http://purl.org/dc/terms/".to_string());
        let serialized = write_jsonld(&quads, JsonLdProfile::Compacted, &prefixes);
        assert!(serialized.contains("dc:title"));
    }
}
