//! A minimal SPARQL 1.1 Update evaluator covering the `DELETE {...} WHERE {...}`
//! / `INSERT {...} WHERE {...}` shape PATCH requests use against the
//! user-managed graph (spec.md §4.5 C8, §8 scenario 2). No `CONSTRUCT`-style
//! nested graph patterns, no `FILTER`, no `OPTIONAL` — variable bindings come
//! from a flat conjunction of triple patterns joined by shared variable names.

use crate::error::{IoError, IoResult};
use std::collections::HashMap;
use trellis_rdf::term::unescape_lexical;
use trellis_rdf::{BlankNode, Iri, Literal, NamedOrBlank, Quad, Term};

#[derive(Clone, Debug)]
enum PatternTerm {
    Iri(Iri),
    Variable(String),
    Literal(Literal),
}

#[derive(Clone, Debug)]
struct TriplePattern {
    subject: PatternTerm,
    predicate: PatternTerm,
    object: PatternTerm,
}

enum OperationKind {
    Delete,
    Insert,
}

struct Operation {
    kind: OperationKind,
    template: Vec<TriplePattern>,
    where_patterns: Vec<TriplePattern>,
}

/// Applies a SPARQL-Update document to `graph` in place. `base` resolves the
/// empty relative IRI `<>` that PATCH bodies commonly use to name the subject
/// resource itself.
pub fn apply_update(graph: &mut Vec<Quad>, update: &str, base: &Iri) -> IoResult<()> {
    let operations = parse_update(update, base)?;
    for operation in operations {
        let bindings = match_patterns(graph, &operation.where_patterns);
        match operation.kind {
            OperationKind::Delete => {
                for binding in &bindings {
                    for pattern in &operation.template {
                        let quad = instantiate(pattern, binding, base)?;
                        graph.retain(|q| *q != quad);
                    }
                }
            }
            OperationKind::Insert => {
                for binding in &bindings {
                    for pattern in &operation.template {
                        let quad = instantiate(pattern, binding, base)?;
                        if !graph.contains(&quad) {
                            graph.push(quad);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// The predicates named as concrete IRIs in any `DELETE`/`INSERT` template
/// (not `WHERE` patterns) of `update` -- used by the HTTP layer to reject a
/// PATCH that attempts to write server-managed or containment triples
/// (spec.md §4.7: such a PATCH "fail[s] with `409 Conflict`").
pub fn template_predicates(update: &str, base: &Iri) -> IoResult<Vec<Iri>> {
    let operations = parse_update(update, base)?;
    Ok(operations
        .iter()
        .flat_map(|operation| operation.template.iter())
        .filter_map(|pattern| match &pattern.predicate {
            PatternTerm::Iri(iri) => Some(iri.clone()),
            _ => None,
        })
        .collect())
}

fn parse_update(update: &str, base: &Iri) -> IoResult<Vec<Operation>> {
    let tokens = tokenize(update)?;
    let mut pos = 0;
    let mut operations = Vec::new();

    while pos < tokens.len() {
        let keyword = tokens[pos].as_str();
        let kind = match keyword {
            "DELETE" => OperationKind::Delete,
            "INSERT" => OperationKind::Insert,
            other => return Err(IoError::BadSparqlUpdate(format!("expected DELETE or INSERT, found {other}"))),
        };
        pos += 1;
        let (template, next) = parse_block(&tokens, pos, base)?;
        pos = next;
        expect(&tokens, pos, "WHERE")?;
        pos += 1;
        let (where_patterns, next) = parse_block(&tokens, pos, base)?;
        pos = next;
        operations.push(Operation { kind, template, where_patterns });

        if pos < tokens.len() && tokens[pos] == ";" {
            pos += 1;
        }
    }

    Ok(operations)
}

fn expect(tokens: &[String], pos: usize, expected: &str) -> IoResult<()> {
    if tokens.get(pos).map(String::as_str) != Some(expected) {
        return Err(IoError::BadSparqlUpdate(format!("expected {expected}")));
    }
    Ok(())
}

/// Parses a `{ triple . triple . }` block starting at `pos` (which must point at
/// `{`), returning the parsed triple patterns and the index just past `}`.
fn parse_block(tokens: &[String], pos: usize, base: &Iri) -> IoResult<(Vec<TriplePattern>, usize)> {
    expect(tokens, pos, "{")?;
    let mut pos = pos + 1;
    let mut patterns = Vec::new();

    while pos < tokens.len() && tokens[pos] != "}" {
        if tokens[pos] == "." {
            pos += 1;
            continue;
        }
        if pos + 2 >= tokens.len() {
            return Err(IoError::BadSparqlUpdate("truncated triple pattern".into()));
        }
        let subject = parse_pattern_term(&tokens[pos], base)?;
        let predicate = parse_pattern_term(&tokens[pos + 1], base)?;
        let object = parse_pattern_term(&tokens[pos + 2], base)?;
        patterns.push(TriplePattern { subject, predicate, object });
        pos += 3;
    }
    expect(tokens, pos, "}")?;
    Ok((patterns, pos + 1))
}

fn parse_pattern_term(token: &str, base: &Iri) -> IoResult<PatternTerm> {
    if let Some(name) = token.strip_prefix('?') {
        return Ok(PatternTerm::Variable(name.to_string()));
    }
    if token == "<>" {
        return Ok(PatternTerm::Iri(base.clone()));
    }
    if let Some(inner) = token.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        return Ok(PatternTerm::Iri(Iri::new(inner)));
    }
    if token.starts_with('"') {
        return parse_literal_token(token)
            .map(PatternTerm::Literal)
            .ok_or_else(|| IoError::BadSparqlUpdate(format!("unparseable literal: {token}")));
    }
    Err(IoError::BadSparqlUpdate(format!("unparseable term: {token}")))
}

fn parse_literal_token(token: &str) -> Option<Literal> {
    let mut end = None;
    let mut escaped = false;
    for (i, c) in token.char_indices().skip(1) {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => {
                end = Some(i);
                break;
            }
            _ => {}
        }
    }
    let end = end?;
    let lexical = unescape_lexical(&token[1..end]);
    let rest = &token[end + 1..];
    if rest.is_empty() {
        return Some(Literal::plain(lexical));
    }
    if let Some(lang) = rest.strip_prefix('@') {
        return Some(Literal::lang(lexical, lang));
    }
    if let Some(dt) = rest.strip_prefix("^^") {
        let dt_iri = dt.strip_prefix('<')?.strip_suffix('>')?;
        return Some(Literal::typed(lexical, Iri::new(dt_iri)));
    }
    None
}

type Binding = HashMap<String, Term>;

fn match_patterns(graph: &[Quad], patterns: &[TriplePattern]) -> Vec<Binding> {
    let mut bindings: Vec<Binding> = vec![HashMap::new()];
    for pattern in patterns {
        let mut next = Vec::new();
        for binding in &bindings {
            for quad in graph {
                if let Some(extended) = try_match(pattern, quad, binding) {
                    next.push(extended);
                }
            }
        }
        bindings = next;
        if bindings.is_empty() {
            break;
        }
    }
    bindings
}

fn try_match(pattern: &TriplePattern, quad: &Quad, binding: &Binding) -> Option<Binding> {
    let subject_term = Term::from(quad.subject.clone());
    let b1 = unify(&pattern.subject, &subject_term, binding)?;
    let predicate_term = Term::Iri(quad.predicate.clone());
    let b2 = unify(&pattern.predicate, &predicate_term, &b1)?;
    unify(&pattern.object, &quad.object, &b2)
}

fn unify(pattern: &PatternTerm, value: &Term, binding: &Binding) -> Option<Binding> {
    match pattern {
        PatternTerm::Variable(name) => match binding.get(name) {
            Some(existing) if existing == value => Some(binding.clone()),
            Some(_) => None,
            None => {
                let mut extended = binding.clone();
                extended.insert(name.clone(), value.clone());
                Some(extended)
            }
        },
        PatternTerm::Iri(iri) => matches!(value, Term::Iri(v) if v == iri).then(|| binding.clone()),
        PatternTerm::Literal(lit) => matches!(value, Term::Literal(v) if v == lit).then(|| binding.clone()),
    }
}

/// Fills in a template triple pattern from a binding, producing a concrete quad
/// tagged with `graph`. An empty `WHERE {}` still produces exactly one (empty)
/// binding, so a template with no variables is instantiated exactly once.
fn instantiate(pattern: &TriplePattern, binding: &Binding, graph: &Iri) -> IoResult<Quad> {
    let subject = subst(&pattern.subject, binding)?;
    let predicate = subst(&pattern.predicate, binding)?;
    let object = subst(&pattern.object, binding)?;

    let subject = match subject {
        Term::Iri(iri) => NamedOrBlank::Iri(iri),
        Term::Blank(b) => NamedOrBlank::Blank(b),
        Term::Literal(_) => return Err(IoError::BadSparqlUpdate("a literal cannot appear in subject position".into())),
    };
    let predicate = match predicate {
        Term::Iri(iri) => iri,
        _ => return Err(IoError::BadSparqlUpdate("predicate position must be an IRI".into())),
    };
    Ok(Quad::new(graph.clone(), subject, predicate, object))
}

fn subst(term: &PatternTerm, binding: &Binding) -> IoResult<Term> {
    match term {
        PatternTerm::Iri(iri) => Ok(Term::Iri(iri.clone())),
        PatternTerm::Literal(lit) => Ok(Term::Literal(lit.clone())),
        PatternTerm::Variable(name) => binding
            .get(name)
            .cloned()
            .ok_or_else(|| IoError::BadSparqlUpdate(format!("unbound variable ?{name} in template"))),
    }
}

fn tokenize(input: &str) -> IoResult<Vec<String>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }
        match chars[i] {
            '{' | '}' | '.' | ';' => {
                tokens.push(chars[i].to_string());
                i += 1;
            }
            '<' => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i] != '>' {
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(IoError::BadSparqlUpdate("unterminated IRI reference".into()));
                }
                i += 1;
                tokens.push(chars[start..i].iter().collect());
            }
            '?' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(chars[start..i].iter().collect());
            }
            '"' => {
                let start = i;
                i += 1;
                let mut escaped = false;
                loop {
                    if i >= chars.len() {
                        return Err(IoError::BadSparqlUpdate("unterminated literal".into()));
                    }
                    if escaped {
                        escaped = false;
                        i += 1;
                        continue;
                    }
                    match chars[i] {
                        '\\' => {
                            escaped = true;
                            i += 1;
                        }
                        '"' => {
                            i += 1;
                            break;
                        }
                        _ => i += 1,
                    }
                }
                if i < chars.len() && chars[i] == '@' {
                    i += 1;
                    while i < chars.len() && chars[i].is_alphanumeric() {
                        i += 1;
                    }
                } else if i + 1 < chars.len() && chars[i] == '^' && chars[i + 1] == '^' {
                    i += 2;
                    if i < chars.len() && chars[i] == '<' {
                        i += 1;
                        while i < chars.len() && chars[i] != '>' {
                            i += 1;
                        }
                        if i < chars.len() {
                            i += 1;
                        }
                    }
                }
                tokens.push(chars[start..i].iter().collect());
            }
            _ => {
                let start = i;
                while i < chars.len() && !chars[i].is_whitespace() && !"{}.;".contains(chars[i]) {
                    i += 1;
                }
                tokens.push(chars[start..i].iter().collect());
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_rdf::quad::graphs;

    fn graph_quads() -> Vec<Quad> {
        vec![Quad::new(
            graphs::USER_MANAGED.clone(),
            Iri::new("http://example.org/res1"),
            Iri::new("http://purl.org/dc/terms/title"),
            Term::Literal(Literal::plain("A")),
        )]
    }

    #[test]
    fn deletes_a_matching_triple_by_exact_pattern() {
        let mut graph = graph_quads();
        let base = Iri::new("http://example.org/res1");
        let update = r#"DELETE { <http://example.org/res1> <http://purl.org/dc/terms/title> "A" } WHERE { <http://example.org/res1> <http://purl.org/dc/terms/title> "A" }"#;
        apply_update(&mut graph, update, &base).unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn deletes_by_variable_pattern_and_inserts_the_replacement() {
        let mut graph = graph_quads();
        let base = Iri::new("http://example.org/res1");
        let update = r#"DELETE { <> <http://purl.org/dc/terms/title> ?old } WHERE { <> <http://purl.org/dc/terms/title> ?old } ; INSERT { <> <http://purl.org/dc/terms/title> "B" } WHERE {}"#;
        apply_update(&mut graph, update, &base).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph[0].object, Term::Literal(Literal::plain("B")));
    }

    #[test]
    fn insert_with_empty_where_runs_exactly_once() {
        let mut graph: Vec<Quad> = Vec::new();
        let base = Iri::new("http://example.org/res1");
        let update = r#"INSERT { <> <http://purl.org/dc/terms/title> "Only" } WHERE {}"#;
        apply_update(&mut graph, update, &base).unwrap();
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn unbound_template_variable_is_an_error() {
        let mut graph: Vec<Quad> = Vec::new();
        let base = Iri::new("http://example.org/res1");
        let update = r#"INSERT { <> <http://purl.org/dc/terms/title> ?missing } WHERE {}"#;
        assert!(apply_update(&mut graph, update, &base).is_err());
    }

    #[test]
    fn template_predicates_reports_insert_and_delete_template_predicates_only() {
        let base = Iri::new("http://example.org/res1");
        let update = r#"DELETE { <> <http://www.w3.org/ns/ldp#contains> ?o } WHERE { <> <http://www.w3.org/ns/ldp#contains> ?o } ; INSERT { <> <http://purl.org/dc/terms/title> "B" } WHERE {}"#;
        let predicates = template_predicates(update, &base).unwrap();
        assert_eq!(
            predicates,
            vec![Iri::new("http://www.w3.org/ns/ldp#contains"), Iri::new("http://purl.org/dc/terms/title")]
        );
    }
}
