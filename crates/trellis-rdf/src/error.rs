use thiserror::Error;

/// Errors raised constructing RDF value types directly (not parser errors — the
/// n-quads codec never fails, per spec.md §6; syntax parsing errors for the other
/// RDF syntaxes live in `trellis-io::IoError::BadRdfSyntax`).
#[derive(Debug, Error)]
pub enum RdfError {
    #[error("not a valid IRI: {0}")]
    InvalidIri(String),
}
