//! RDF core value types, the n-quads line codec, and identifier/layout helpers
//! (spec.md components C1 and C2).

pub mod error;
pub mod identifier;
pub mod layout;
pub mod nquads;
pub mod quad;
pub mod resource;
pub mod skolem;
pub mod term;

pub use error::RdfError;
pub use quad::Quad;
pub use resource::{BinaryMeta, Instant, Resource, ResourceState};
pub use term::{BlankNode, Iri, Literal, LiteralKind, NamedOrBlank, Term};
