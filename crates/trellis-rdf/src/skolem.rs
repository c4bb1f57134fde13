//! Blank nodes crossing the wire are skolemized to IRIs under `trellis:bnode/<uuid>`
//! and reversed on read (spec.md §9 "Skolemization"). This is a round-trip
//! invariant: un-skolemizing every skolem IRI in a quad set recovers the original
//! blank node identity for that round-trip (I5 applies only after un-skolemization).

use crate::identifier::BNODE_PREFIX;
use crate::term::{BlankNode, Iri};
use uuid::Uuid;

/// Mints a fresh skolem IRI for a blank node crossing the wire.
pub fn skolemize_new() -> Iri {
    Iri::new(format!("{BNODE_PREFIX}{}", Uuid::new_v4()))
}

/// Returns the blank node a skolem IRI stands for, or `None` if `iri` is not one.
pub fn deskolemize(iri: &Iri) -> Option<BlankNode> {
    iri.as_str().strip_prefix(BNODE_PREFIX).map(BlankNode::new)
}

/// The skolem IRI that round-trips a given blank node label deterministically
/// within one serialization (so the same blank node always maps to the same IRI
/// within a single document).
pub fn skolemize_label(label: &str) -> Iri {
    Iri::new(format!("{BNODE_PREFIX}{label}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skolemize_and_deskolemize_round_trip() {
        let blank = BlankNode::new("b0");
        let iri = skolemize_label(blank.label());
        assert_eq!(deskolemize(&iri).as_ref(), Some(&blank));
    }

    #[test]
    fn non_bnode_iri_deskolemizes_to_none() {
        assert!(deskolemize(&Iri::new("http://example/x")).is_none());
    }
}
