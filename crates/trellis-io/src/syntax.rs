//! C8: RDF syntax negotiation. Each variant maps to the handful of media types a
//! client may ask for via `Accept`/`Content-Type` (spec.md §4.5).

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RdfSyntax {
    Turtle,
    NTriples,
    NQuads,
    JsonLd,
    SparqlUpdate,
}

impl RdfSyntax {
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let base = media_type.split(';').next().unwrap_or(media_type).trim();
        match base {
            "text/turtle" => Some(Self::Turtle),
            "application/n-triples" => Some(Self::NTriples),
            "application/n-quads" => Some(Self::NQuads),
            "application/ld+json" => Some(Self::JsonLd),
            "application/sparql-update" => Some(Self::SparqlUpdate),
            _ => None,
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::Turtle => "text/turtle",
            Self::NTriples => "application/n-triples",
            Self::NQuads => "application/n-quads",
            Self::JsonLd => "application/ld+json",
            Self::SparqlUpdate => "application/sparql-update",
        }
    }
}

/// The three syntax capability lists the I/O service publishes (spec.md §4.5).
/// RDFa read support depends on an HTML serializer collaborator this crate does
/// not provide, so it is never included.
pub fn supported_read_syntaxes() -> Vec<RdfSyntax> {
    vec![RdfSyntax::Turtle, RdfSyntax::NTriples, RdfSyntax::NQuads, RdfSyntax::JsonLd]
}

pub fn supported_write_syntaxes() -> Vec<RdfSyntax> {
    vec![RdfSyntax::Turtle, RdfSyntax::NTriples, RdfSyntax::NQuads, RdfSyntax::JsonLd]
}

pub fn supported_update_syntaxes() -> Vec<RdfSyntax> {
    vec![RdfSyntax::SparqlUpdate]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_media_type_with_parameters() {
        assert_eq!(RdfSyntax::from_media_type("text/turtle; charset=utf-8"), Some(RdfSyntax::Turtle));
    }

    #[test]
    fn rejects_unknown_media_types() {
        assert_eq!(RdfSyntax::from_media_type("application/rdf+xml"), None);
    }
}
