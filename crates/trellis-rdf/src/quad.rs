use crate::term::{Iri, NamedOrBlank, Term};
use std::fmt;

/// A single RDF quad: `(graph, subject, predicate, object)`. Ordering inside a graph
/// is not meaningful; quad sets compare as multisets everywhere in this crate.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Quad {
    pub graph: NamedOrBlank,
    pub subject: NamedOrBlank,
    pub predicate: Iri,
    pub object: Term,
}

impl Quad {
    pub fn new(
        graph: impl Into<NamedOrBlank>,
        subject: impl Into<NamedOrBlank>,
        predicate: impl Into<Iri>,
        object: impl Into<Term>,
    ) -> Self {
        Self {
            graph: graph.into(),
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    pub fn in_graph(&self, graph: &Iri) -> bool {
        matches!(&self.graph, NamedOrBlank::Iri(g) if g == graph)
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {} {} .", self.subject, self.predicate, self.object, self.graph)
    }
}

/// The well-known named graphs every resource's state is partitioned into (spec.md §3).
/// These use a fixed internal namespace; they are never exposed to clients directly —
/// clients select among them via the `Prefer` header (apps/server/src/prefer.rs).
pub mod graphs {
    use super::Iri;
    use once_cell::sync::Lazy;

    macro_rules! graph_iri {
        ($name:ident, $suffix:literal) => {
            pub static $name: Lazy<Iri> =
                Lazy::new(|| Iri::new(concat!("http://www.trellisldp.org/ns/trellis#", $suffix)));
        };
    }

    graph_iri!(USER_MANAGED, "PreferUserManaged");
    graph_iri!(SERVER_MANAGED, "PreferServerManaged");
    graph_iri!(ACCESS_CONTROL, "PreferAccessControl");
    graph_iri!(CONTAINMENT, "PreferContainment");
    graph_iri!(MEMBERSHIP, "PreferMembership");
    graph_iri!(AUDIT, "PreferAudit");
    /// Quads with no explicit 4th n-quads term decode into this graph.
    graph_iri!(DEFAULT, "DefaultGraph");

    /// The default set of graphs a plain `GET` without a `Prefer` header returns.
    pub fn default_included() -> Vec<Iri> {
        vec![USER_MANAGED.clone(), SERVER_MANAGED.clone(), CONTAINMENT.clone(), MEMBERSHIP.clone()]
    }
}

/// Vocabulary IRIs referenced throughout the server (LDP, Dublin Core, WebAC, PROV, AS2).
pub mod vocab {
    use super::Iri;
    use once_cell::sync::Lazy;

    macro_rules! ns_iri {
        ($name:ident, $full:literal) => {
            pub static $name: Lazy<Iri> = Lazy::new(|| Iri::new($full));
        };
    }

    ns_iri!(RDF_TYPE, "http://www.w3.org/1999/02/22-rdf-syntax-ns#type");

    ns_iri!(LDP_RESOURCE, "http://www.w3.org/ns/ldp#Resource");
    ns_iri!(LDP_RDF_SOURCE, "http://www.w3.org/ns/ldp#RDFSource");
    ns_iri!(LDP_NON_RDF_SOURCE, "http://www.w3.org/ns/ldp#NonRDFSource");
    ns_iri!(LDP_CONTAINER, "http://www.w3.org/ns/ldp#Container");
    ns_iri!(LDP_BASIC_CONTAINER, "http://www.w3.org/ns/ldp#BasicContainer");
    ns_iri!(LDP_DIRECT_CONTAINER, "http://www.w3.org/ns/ldp#DirectContainer");
    ns_iri!(LDP_INDIRECT_CONTAINER, "http://www.w3.org/ns/ldp#IndirectContainer");
    ns_iri!(LDP_CONTAINS, "http://www.w3.org/ns/ldp#contains");
    ns_iri!(LDP_MEMBERSHIP_RESOURCE, "http://www.w3.org/ns/ldp#membershipResource");
    ns_iri!(LDP_HAS_MEMBER_RELATION, "http://www.w3.org/ns/ldp#hasMemberRelation");
    ns_iri!(LDP_IS_MEMBER_OF_RELATION, "http://www.w3.org/ns/ldp#isMemberOfRelation");
    ns_iri!(LDP_INSERTED_CONTENT_RELATION, "http://www.w3.org/ns/ldp#insertedContentRelation");

    ns_iri!(DC_MODIFIED, "http://purl.org/dc/terms/modified");
    ns_iri!(DC_HAS_PART, "http://purl.org/dc/terms/hasPart");
    ns_iri!(DC_IS_PART_OF, "http://purl.org/dc/terms/isPartOf");
    ns_iri!(DC_FORMAT, "http://purl.org/dc/terms/format");
    ns_iri!(DC_EXTENT, "http://purl.org/dc/terms/extent");
    ns_iri!(DC_TITLE, "http://purl.org/dc/terms/title");

    ns_iri!(ACL_ACCESS_TO, "http://www.w3.org/ns/auth/acl#accessTo");
    ns_iri!(ACL_DEFAULT, "http://www.w3.org/ns/auth/acl#default");
    ns_iri!(ACL_AGENT, "http://www.w3.org/ns/auth/acl#agent");
    ns_iri!(ACL_AGENT_CLASS, "http://www.w3.org/ns/auth/acl#agentClass");
    ns_iri!(ACL_AGENT_GROUP, "http://www.w3.org/ns/auth/acl#agentGroup");
    ns_iri!(ACL_MODE, "http://www.w3.org/ns/auth/acl#mode");
    ns_iri!(ACL_AUTHORIZATION, "http://www.w3.org/ns/auth/acl#Authorization");
    ns_iri!(ACL_READ, "http://www.w3.org/ns/auth/acl#Read");
    ns_iri!(ACL_WRITE, "http://www.w3.org/ns/auth/acl#Write");
    ns_iri!(ACL_APPEND, "http://www.w3.org/ns/auth/acl#Append");
    ns_iri!(ACL_CONTROL, "http://www.w3.org/ns/auth/acl#Control");
    ns_iri!(ACL_AUTHENTICATED_AGENT, "http://www.w3.org/ns/auth/acl#AuthenticatedAgent");
    ns_iri!(FOAF_AGENT, "http://xmlns.com/foaf/0.1/Agent");
    ns_iri!(VCARD_HAS_MEMBER, "http://www.w3.org/2006/vcard/ns#hasMember");

    ns_iri!(PROV_ACTIVITY, "http://www.w3.org/ns/prov#Activity");
    ns_iri!(AS_CREATE, "https://www.w3.org/ns/activitystreams#Create");
    ns_iri!(AS_UPDATE, "https://www.w3.org/ns/activitystreams#Update");
    ns_iri!(AS_DELETE, "https://www.w3.org/ns/activitystreams#Delete");
}
