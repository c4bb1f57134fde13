use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported RDF syntax: {0}")]
    UnsupportedSyntax(String),
    #[error("malformed {syntax} document: {reason}")]
    BadRdfSyntax { syntax: &'static str, reason: String },
    #[error("malformed SPARQL-Update request: {0}")]
    BadSparqlUpdate(String),
    #[error(transparent)]
    Storage(#[from] std::io::Error),
    #[error("namespace prefix already bound to a different namespace: {0}")]
    PrefixConflict(String),
}

pub type IoResult<T> = Result<T, IoError>;
