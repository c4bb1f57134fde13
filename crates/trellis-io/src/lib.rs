//! Namespace persistence, RDF syntax codecs, and the SPARQL-Update evaluator
//! (spec.md components C7 and C8).

pub mod error;
pub mod jsonld;
pub mod namespace;
pub mod sparql;
pub mod syntax;
pub mod turtle;

pub use error::{IoError, IoResult};
pub use jsonld::{read_jsonld, write_jsonld, JsonLdProfile, ProfileCache};
pub use namespace::NamespaceService;
pub use sparql::{apply_update, template_predicates};
pub use syntax::{supported_read_syntaxes, supported_update_syntaxes, supported_write_syntaxes, RdfSyntax};
pub use turtle::{read_turtle, write_turtle};
