use std::fmt;
use std::sync::Arc;

/// An IRI. Cheap to clone; comparisons and hashing operate on the underlying string.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Iri(Arc<str>);

impl Iri {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Iri({:?})", self.0)
    }
}

impl From<&str> for Iri {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl From<String> for Iri {
    fn from(value: String) -> Self {
        Self(Arc::from(value.as_str()))
    }
}

impl std::ops::Deref for Iri {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

/// A blank node identifier, local to one parse/serialization round-trip unless skolemized.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlankNode(Arc<str>);

impl BlankNode {
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

impl fmt::Debug for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlankNode({:?})", self.0)
    }
}

/// Subject or graph-name position: an IRI or a blank node.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum NamedOrBlank {
    Iri(Iri),
    Blank(BlankNode),
}

impl fmt::Display for NamedOrBlank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamedOrBlank::Iri(iri) => write!(f, "<{iri}>"),
            NamedOrBlank::Blank(b) => write!(f, "{b}"),
        }
    }
}

impl From<Iri> for NamedOrBlank {
    fn from(iri: Iri) -> Self {
        NamedOrBlank::Iri(iri)
    }
}

impl From<BlankNode> for NamedOrBlank {
    fn from(blank: BlankNode) -> Self {
        NamedOrBlank::Blank(blank)
    }
}

/// An RDF literal: a lexical value with either no tag, a language tag, or a datatype IRI.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Literal {
    pub lexical: Arc<str>,
    pub kind: LiteralKind,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum LiteralKind {
    Plain,
    Lang(Arc<str>),
    Typed(Iri),
}

impl Literal {
    pub fn plain(value: impl Into<Arc<str>>) -> Self {
        Self { lexical: value.into(), kind: LiteralKind::Plain }
    }

    pub fn lang(value: impl Into<Arc<str>>, lang: impl Into<Arc<str>>) -> Self {
        Self { lexical: value.into(), kind: LiteralKind::Lang(lang.into()) }
    }

    pub fn typed(value: impl Into<Arc<str>>, datatype: Iri) -> Self {
        Self { lexical: value.into(), kind: LiteralKind::Typed(datatype) }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape_lexical(&self.lexical))?;
        match &self.kind {
            LiteralKind::Plain => Ok(()),
            LiteralKind::Lang(lang) => write!(f, "@{lang}"),
            LiteralKind::Typed(dt) => write!(f, "^^<{dt}>"),
        }
    }
}

fn escape_lexical(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

pub fn unescape_lexical(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Any RDF term usable in object position: IRI, blank node, or literal.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Term {
    Iri(Iri),
    Blank(BlankNode),
    Literal(Literal),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::Blank(b) => write!(f, "{b}"),
            Term::Literal(lit) => write!(f, "{lit}"),
        }
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Term::Iri(iri)
    }
}

impl From<NamedOrBlank> for Term {
    fn from(value: NamedOrBlank) -> Self {
        match value {
            NamedOrBlank::Iri(iri) => Term::Iri(iri),
            NamedOrBlank::Blank(b) => Term::Blank(b),
        }
    }
}
