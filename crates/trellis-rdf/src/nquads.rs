//! A lenient n-quads line codec (spec.md §6 "N-quads line format").
//!
//! `S P O [G] .` separated by single spaces. Lines that start with whitespace, or
//! that tokenize to fewer than three terms, are dropped with a `warn!` log rather
//! than failing the whole read — a single corrupt snapshot line must not make an
//! entire resource unreadable.

use crate::quad::graphs;
use crate::term::{unescape_lexical, BlankNode, Iri, Literal, LiteralKind, NamedOrBlank, Term};
use crate::Quad;

/// Parses a full n-quads document, skipping malformed lines with a warning.
pub fn parse_nquads(input: &str) -> Vec<Quad> {
    input
        .lines()
        .filter_map(|line| parse_line(line))
        .collect()
}

/// Parses one n-quads line. Returns `None` (after logging) if the line is blank,
/// a comment, indented, or does not tokenize into at least subject/predicate/object.
pub fn parse_line(line: &str) -> Option<Quad> {
    if line.is_empty() || line.starts_with(char::is_whitespace) || line.starts_with('#') {
        return None;
    }
    let tokens = match tokenize(line) {
        Ok(tokens) => tokens,
        Err(reason) => {
            tracing::warn!(%reason, %line, "dropping malformed n-quads line");
            return None;
        }
    };
    if tokens.len() < 3 {
        tracing::warn!(%line, "dropping n-quads line with fewer than three terms");
        return None;
    }

    let subject = match parse_subject_or_graph(&tokens[0]) {
        Some(s) => s,
        None => {
            tracing::warn!(%line, "dropping n-quads line with unparseable subject");
            return None;
        }
    };
    let predicate = match parse_iri(&tokens[1]) {
        Some(p) => p,
        None => {
            tracing::warn!(%line, "dropping n-quads line with unparseable predicate");
            return None;
        }
    };
    let object = match parse_object(&tokens[2]) {
        Some(o) => o,
        None => {
            tracing::warn!(%line, "dropping n-quads line with unparseable object");
            return None;
        }
    };
    let graph = if tokens.len() >= 4 {
        match parse_subject_or_graph(&tokens[3]) {
            Some(g) => g,
            None => NamedOrBlank::Iri(graphs::DEFAULT.clone()),
        }
    } else {
        NamedOrBlank::Iri(graphs::DEFAULT.clone())
    };

    Some(Quad { graph, subject, predicate, object })
}

/// Serializes quads as an n-quads document, one line per quad.
pub fn write_nquads(quads: &[Quad]) -> String {
    let mut out = String::new();
    for quad in quads {
        out.push_str(&quad.to_string());
        out.push('\n');
    }
    out
}

fn parse_iri(token: &str) -> Option<Iri> {
    let inner = token.strip_prefix('<')?.strip_suffix('>')?;
    Some(Iri::new(inner))
}

fn parse_subject_or_graph(token: &str) -> Option<NamedOrBlank> {
    if token.starts_with('<') {
        parse_iri(token).map(NamedOrBlank::Iri)
    } else if let Some(label) = token.strip_prefix("_:") {
        Some(NamedOrBlank::Blank(BlankNode::new(label)))
    } else {
        None
    }
}

fn parse_object(token: &str) -> Option<Term> {
    if token.starts_with('<') {
        return parse_iri(token).map(Term::Iri);
    }
    if let Some(label) = token.strip_prefix("_:") {
        return Some(Term::Blank(BlankNode::new(label)));
    }
    if token.starts_with('"') {
        return parse_literal(token);
    }
    None
}

fn parse_literal(token: &str) -> Option<Term> {
    let bytes = token.as_bytes();
    if bytes.is_empty() || bytes[0] != b'"' {
        return None;
    }
    // Find the unescaped closing quote.
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
        return Some(Term::Literal(Literal { lexical: lexical.into(), kind: LiteralKind::Plain }));
    }
    if let Some(lang) = rest.strip_prefix('@') {
        return Some(Term::Literal(Literal {
            lexical: lexical.into(),
            kind: LiteralKind::Lang(lang.into()),
        }));
    }
    if let Some(dt) = rest.strip_prefix("^^") {
        let dt_iri = parse_iri(dt)?;
        return Some(Term::Literal(Literal {
            lexical: lexical.into(),
            kind: LiteralKind::Typed(dt_iri),
        }));
    }
    None
}

/// Splits a line into whitespace-delimited tokens, respecting `<...>` IRI refs and
/// `"..."` literal bodies (which may themselves contain escaped quotes/backslashes),
/// and dropping the trailing `.` statement terminator.
fn tokenize(line: &str) -> Result<Vec<String>, &'static str> {
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
        if chars[i] == '.' && (i + 1 == chars.len() || chars[i + 1].is_whitespace()) {
            i += 1;
            continue;
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
                // absorb an optional @lang or ^^<iri> suffix into the same token
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
    fn round_trips_a_plain_triple_with_default_graph() {
        let line = r#"<http://example/s> <http://example/p> "hello" ."#;
        let quad = parse_line(line).expect("parses");
        assert_eq!(quad.graph, NamedOrBlank::Iri(graphs::DEFAULT.clone()));
        let serialized = quad.to_string();
        let reparsed = parse_line(&serialized).expect("reparses");
        assert_eq!(quad, reparsed);
    }

    #[test]
    fn parses_quad_with_named_graph_and_blank_subject() {
        let line = r#"_:b1 <http://example/p> <http://example/o> <http://example/g> ."#;
        let quad = parse_line(line).expect("parses");
        assert_eq!(quad.subject, NamedOrBlank::Blank(BlankNode::new("b1")));
        assert_eq!(quad.graph, NamedOrBlank::Iri(Iri::new("http://example/g")));
    }

    #[test]
    fn parses_lang_tagged_and_typed_literals() {
        let lang = parse_object(r#""bonjour"@fr"#).unwrap();
        match lang {
            Term::Literal(l) => assert_eq!(l.kind, LiteralKind::Lang("fr".into())),
            _ => panic!("expected literal"),
        }
        let typed = parse_object(r#""42"^^<http://www.w3.org/2001/XMLSchema#integer>"#).unwrap();
        match typed {
            Term::Literal(l) => {
                assert_eq!(l.kind, LiteralKind::Typed(Iri::new("http://www.w3.org/2001/XMLSchema#integer")))
            }
            _ => panic!("expected literal"),
        }
    }

    #[test]
    fn drops_indented_and_short_lines_without_panicking() {
        assert!(parse_line("  <http://example/s> <http://example/p> <http://example/o> .").is_none());
        assert!(parse_line("<http://example/s> <http://example/p> .").is_none());
        assert!(parse_line("").is_none());
    }

    #[test]
    fn escapes_quotes_and_backslashes_in_literals_on_write() {
        let quad = Quad::new(
            Iri::new("http://example/g"),
            Iri::new("http://example/s"),
            Iri::new("http://example/p"),
            Term::Literal(Literal::plain("she said \"hi\"\\done")),
        );
        let line = quad.to_string();
        let reparsed = parse_line(&line).expect("reparses");
        assert_eq!(quad, reparsed);
    }
}
