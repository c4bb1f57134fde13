//! A pragmatic, line-oriented Turtle subset: one `@prefix`/`@base` directive or
//! one `subject predicate object .` statement per line. Collections, blank-node
//! property lists, and multi-line statements are not supported — scope decision
//! recorded in DESIGN.md. Malformed lines fail the whole parse (unlike n-quads,
//! which is lenient); Turtle is a client-facing write format and a bad upload
//! should be rejected, not silently truncated.

use crate::error::{IoError, IoResult};
use std::collections::HashMap;
use trellis_rdf::term::unescape_lexical;
use trellis_rdf::{BlankNode, Iri, Literal, LiteralKind, NamedOrBlank, Quad, Term};

pub fn read_turtle(input: &str, graph: &Iri, base: &Iri) -> IoResult<Vec<Quad>> {
    let mut prefixes: HashMap<String, String> = HashMap::new();
    let mut current_base = base.clone();
    let mut quads = Vec::new();

    for (lineno, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("@prefix").or_else(|| line.strip_prefix("PREFIX")) {
            let (prefix, iri) = parse_prefix_directive(rest)
                .ok_or_else(|| bad_line(lineno, "malformed @prefix directive"))?;
            prefixes.insert(prefix, iri);
            continue;
        }
        if let Some(rest) = line.strip_prefix("@base").or_else(|| line.strip_prefix("BASE")) {
            let iri = parse_base_directive(rest).ok_or_else(|| bad_line(lineno, "malformed @base directive"))?;
            current_base = Iri::new(iri);
            continue;
        }

        let tokens = tokenize(line).map_err(|reason| bad_line(lineno, reason))?;
        if tokens.len() != 3 {
            return Err(bad_line(lineno, "expected exactly subject, predicate, object"));
        }
        let subject = resolve_subject_or_predicate(&tokens[0], &prefixes, &current_base)
            .ok_or_else(|| bad_line(lineno, "unparseable subject"))?;
        let predicate = resolve_iri_term(&tokens[1], &prefixes, &current_base)
            .ok_or_else(|| bad_line(lineno, "unparseable predicate"))?;
        let object = resolve_object(&tokens[2], &prefixes, &current_base)
            .ok_or_else(|| bad_line(lineno, "unparseable object"))?;
        quads.push(Quad::new(graph.clone(), subject, predicate, object));
    }

    Ok(quads)
}

pub fn write_turtle(quads: &[Quad], prefixes: &HashMap<String, String>) -> String {
    let mut out = String::new();
    let mut sorted_prefixes: Vec<_> = prefixes.iter().collect();
    sorted_prefixes.sort_by_key(|(prefix, _)| prefix.as_str());
    for (prefix, namespace) in sorted_prefixes {
        out.push_str(&format!("@prefix {prefix}: <{namespace}> .\n"));
    }
    if !prefixes.is_empty() {
        out.push('\n');
    }
    for quad in quads {
        out.push_str(&format!("{} <{}> {} .\n", quad.subject, quad.predicate, quad.object));
    }
    out
}

fn bad_line(lineno: usize, reason: impl Into<String>) -> IoError {
    IoError::BadRdfSyntax { syntax: "turtle", reason: format!("line {}: {}", lineno + 1, reason.into()) }
}

fn parse_prefix_directive(rest: &str) -> Option<(String, String)> {
    let rest = rest.trim().strip_suffix('.').unwrap_or(rest.trim()).trim();
    let (name, iri) = rest.split_once(':')?;
    let iri = iri.trim();
    let iri = iri.strip_prefix('<')?.strip_suffix('>')?;
    Some((name.trim().to_string(), iri.to_string()))
}

fn parse_base_directive(rest: &str) -> Option<String> {
    let rest = rest.trim().strip_suffix('.').unwrap_or(rest.trim()).trim();
    let iri = rest.strip_prefix('<')?.strip_suffix('>')?;
    Some(iri.to_string())
}

fn expand_iri(token: &str, prefixes: &HashMap<String, String>, base: &Iri) -> Option<Iri> {
    if token == "<>" {
        return Some(base.clone());
    }
    if let Some(inner) = token.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        return Some(Iri::new(inner));
    }
    let (prefix, local) = token.split_once(':')?;
    let namespace = prefixes.get(prefix)?;
    Some(Iri::new(format!("{namespace}{local}")))
}

fn resolve_iri_term(token: &str, prefixes: &HashMap<String, String>, base: &Iri) -> Option<Iri> {
    expand_iri(token, prefixes, base)
}

fn resolve_subject_or_predicate(token: &str, prefixes: &HashMap<String, String>, base: &Iri) -> Option<NamedOrBlank> {
    if let Some(label) = token.strip_prefix("_:") {
        return Some(NamedOrBlank::Blank(BlankNode::new(label)));
    }
    expand_iri(token, prefixes, base).map(NamedOrBlank::Iri)
}

fn resolve_object(token: &str, prefixes: &HashMap<String, String>, base: &Iri) -> Option<Term> {
    if token.starts_with('"') {
        return parse_literal(token);
    }
    if let Some(label) = token.strip_prefix("_:") {
        return Some(Term::Blank(BlankNode::new(label)));
    }
    expand_iri(token, prefixes, base).map(Term::Iri)
}

fn parse_literal(token: &str) -> Option<Term> {
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
        return Some(Term::Literal(Literal::plain(lexical)));
    }
    if let Some(lang) = rest.strip_prefix('@') {
        return Some(Term::Literal(Literal::lang(lexical, lang)));
    }
    if let Some(dt) = rest.strip_prefix("^^") {
        let dt_iri = dt.strip_prefix('<')?.strip_suffix('>')?;
        return Some(Term::Literal(Literal::typed(lexical, Iri::new(dt_iri))));
    }
    None
}

/// Splits a statement line into exactly three whitespace-delimited tokens,
/// respecting `<...>` and `"..."` bodies the same way the n-quads tokenizer does.
fn tokenize(line: &str) -> Result<Vec<String>, &'static str> {
    let line = line.strip_suffix('.').unwrap_or(line);
    let mut tokens = Vec::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }
        let start = i;
        match chars[i] {
            '<' => {
                i += 1;
                while i < chars.len() && chars[i] != '>' {
                    i += 1;
                }
                if i >= chars.len() {
                    return Err("unterminated IRI reference");
                }
                i += 1;
            }
            '"' => {
                i += 1;
                let mut escaped = false;
                loop {
                    if i >= chars.len() {
                        return Err("unterminated literal");
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
                    while i < chars.len() && !chars[i].is_whitespace() {
                        i += 1;
                    }
                } else if i + 1 < chars.len() && chars[i] == '^' && chars[i + 1] == '^' {
                    i += 2;
                    if i < chars.len() && chars[i] == '<' {
                        i += 1;
                        while i < chars.len() && chars[i] != '>' {
                            i += 1;
                        }
                        if i >= chars.len() {
                            return Err("unterminated datatype IRI");
                        }
                        i += 1;
                    }
                }
            }
            _ => {
                while i < chars.len() && !chars[i].is_whitespace() {
                    i += 1;
                }
            }
        }
        tokens.push(chars[start..i].iter().collect());
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_a_prefixed_document() {
        let input = "@prefix dc: <http://purl.org/dc/terms/> .\n<http://example.org/res1> dc:title \"Hello\" .\n";
        let graph = Iri::new("http://example.org/graph");
        let base = Iri::new("http://example.org/");
        let quads = read_turtle(input, &graph, &base).unwrap();
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].predicate, Iri::new("http://purl.org/dc/terms/title"));
    }

    #[test]
    fn empty_relative_iri_resolves_to_base() {
        let input = "<> <http://purl.org/dc/terms/title> \"Hello\" .\n";
        let graph = Iri::new("http://example.org/graph");
        let base = Iri::new("http://example.org/res1");
        let quads = read_turtle(input, &graph, &base).unwrap();
        assert_eq!(quads[0].subject, NamedOrBlank::Iri(base));
    }

    #[test]
    fn rejects_a_statement_with_the_wrong_arity() {
        let input = "<http://example.org/res1> <http://purl.org/dc/terms/title> .\n";
        let graph = Iri::new("http://example.org/graph");
        let base = Iri::new("http://example.org/");
        assert!(read_turtle(input, &graph, &base).is_err());
    }

    #[test]
    fn write_then_read_round_trips_a_simple_graph() {
        let graph = Iri::new("http://example.org/graph");
        let quads = vec![Quad::new(
            graph.clone(),
            Iri::new("http://example.org/res1"),
            Iri::new("http://purl.org/dc/terms/title"),
            Term::Literal(Literal::plain("Hello")),
        )];
        let serialized = write_turtle(&quads, &HashMap::new());
        let reparsed = read_turtle(&serialized, &graph, &Iri::new("http://example.org/")).unwrap();
        assert_eq!(reparsed, quads);
    }
}
