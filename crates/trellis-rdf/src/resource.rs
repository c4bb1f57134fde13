//! The `Resource` value type and its sentinel variants (spec.md §3, §9).
//!
//! A `Resource` is a materialized view over the quads belonging to one identifier,
//! already partitioned by named graph. Building one is the job of the storage layer
//! (`trellis-storage`); this crate only defines the shape so that every layer above
//! storage shares one vocabulary for "resource or missing or deleted".

use crate::quad::{graphs, vocab};
use crate::term::{Iri, Term};
use crate::Quad;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMeta {
    pub id: String,
    pub modified: Instant,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
}

/// 1-second-precision instant, matching the on-disk epoch-second granularity used
/// by the Memento engine (spec.md §3 "modified: Instant (1-s precision...)").
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(pub i64);

impl Instant {
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs();
        Self(secs as i64)
    }

    pub fn epoch_seconds(self) -> i64 {
        self.0
    }

    pub fn from_epoch_seconds(secs: i64) -> Self {
        Self(secs)
    }
}

#[derive(Clone, Debug)]
pub struct Resource {
    pub identifier: Iri,
    pub interaction_model: Iri,
    pub modified: Instant,
    pub container: Option<Iri>,
    pub binary: Option<BinaryMeta>,
    pub membership_resource: Option<Iri>,
    pub member_relation: Option<Iri>,
    pub member_of_relation: Option<Iri>,
    pub inserted_content_relation: Option<Iri>,
    pub has_acl: bool,
    pub is_memento: bool,
    quads_by_graph: Vec<(Iri, Vec<Quad>)>,
}

impl Resource {
    pub fn builder(identifier: Iri, interaction_model: Iri, modified: Instant) -> ResourceBuilder {
        ResourceBuilder {
            identifier,
            interaction_model,
            modified,
            container: None,
            binary: None,
            membership_resource: None,
            member_relation: None,
            member_of_relation: None,
            inserted_content_relation: None,
            is_memento: false,
            quads_by_graph: Vec::new(),
        }
    }

    pub fn is_container(&self) -> bool {
        [
            &*vocab::LDP_CONTAINER,
            &*vocab::LDP_BASIC_CONTAINER,
            &*vocab::LDP_DIRECT_CONTAINER,
            &*vocab::LDP_INDIRECT_CONTAINER,
        ]
        .iter()
        .any(|model| **model == self.interaction_model)
    }

    pub fn is_non_rdf_source(&self) -> bool {
        self.interaction_model == *vocab::LDP_NON_RDF_SOURCE
    }

    /// Lazily selects quads belonging to any of `selected_graphs`.
    pub fn stream<'a>(&'a self, selected_graphs: &'a [Iri]) -> impl Iterator<Item = &'a Quad> + 'a {
        self.quads_by_graph
            .iter()
            .filter(move |(graph, _)| selected_graphs.contains(graph))
            .flat_map(|(_, quads)| quads.iter())
    }

    pub fn graph(&self, graph: &Iri) -> &[Quad] {
        self.quads_by_graph
            .iter()
            .find(|(g, _)| g == graph)
            .map(|(_, quads)| quads.as_slice())
            .unwrap_or(&[])
    }

    pub fn all_quads(&self) -> impl Iterator<Item = &Quad> + '_ {
        self.quads_by_graph.iter().flat_map(|(_, quads)| quads.iter())
    }

    /// Appends quads from a graph this `Resource` did not already carry — used to
    /// join in the audit store's `PreferAudit` graph at read time (spec.md §4.3).
    pub fn with_extra_graph(mut self, graph: Iri, quads: Vec<Quad>) -> Self {
        self.quads_by_graph.push((graph, quads));
        self
    }
}

pub struct ResourceBuilder {
    identifier: Iri,
    interaction_model: Iri,
    modified: Instant,
    container: Option<Iri>,
    binary: Option<BinaryMeta>,
    membership_resource: Option<Iri>,
    member_relation: Option<Iri>,
    member_of_relation: Option<Iri>,
    inserted_content_relation: Option<Iri>,
    is_memento: bool,
    quads_by_graph: Vec<(Iri, Vec<Quad>)>,
}

impl ResourceBuilder {
    pub fn container(mut self, container: Option<Iri>) -> Self {
        self.container = container;
        self
    }

    pub fn binary(mut self, binary: Option<BinaryMeta>) -> Self {
        self.binary = binary;
        self
    }

    pub fn membership(
        mut self,
        resource: Option<Iri>,
        member_relation: Option<Iri>,
        member_of_relation: Option<Iri>,
        inserted_content_relation: Option<Iri>,
    ) -> Self {
        self.membership_resource = resource;
        self.member_relation = member_relation;
        self.member_of_relation = member_of_relation;
        self.inserted_content_relation = inserted_content_relation;
        self
    }

    pub fn is_memento(mut self, value: bool) -> Self {
        self.is_memento = value;
        self
    }

    pub fn with_graph(mut self, graph: Iri, quads: Vec<Quad>) -> Self {
        self.quads_by_graph.push((graph, quads));
        self
    }

    pub fn build(self) -> Resource {
        let has_acl = self
            .quads_by_graph
            .iter()
            .any(|(g, quads)| *g == *graphs::ACCESS_CONTROL && !quads.is_empty());
        Resource {
            identifier: self.identifier,
            interaction_model: self.interaction_model,
            modified: self.modified,
            container: self.container,
            binary: self.binary,
            membership_resource: self.membership_resource,
            member_relation: self.member_relation,
            member_of_relation: self.member_of_relation,
            inserted_content_relation: self.inserted_content_relation,
            has_acl,
            is_memento: self.is_memento,
            quads_by_graph: self.quads_by_graph,
        }
    }
}

/// The three outcomes a resource lookup must be able to distinguish (spec.md §3,
/// §9 "Sentinel resources"): present, never existed, and tombstoned.
#[derive(Clone, Debug)]
pub enum ResourceState {
    Present(Resource),
    Missing,
    Deleted,
}

impl ResourceState {
    pub fn as_present(&self) -> Option<&Resource> {
        match self {
            ResourceState::Present(r) => Some(r),
            _ => None,
        }
    }
}

/// Extracts the object of the first quad matching `predicate` as an IRI, used when
/// reconstructing a `Resource` from its server-managed quads.
pub fn find_iri_object<'a>(quads: &'a [Quad], predicate: &Iri) -> Option<&'a Iri> {
    quads.iter().find(|q| q.predicate == *predicate).and_then(|q| match &q.object {
        Term::Iri(iri) => Some(iri),
        _ => None,
    })
}
