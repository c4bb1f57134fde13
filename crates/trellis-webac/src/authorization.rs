//! ACL graph parsing: turns a `PreferAccessControl` quad set into a list of
//! `Authorization` rules (spec.md §4.6).

use std::collections::{HashMap, HashSet};
use trellis_rdf::quad::vocab;
use trellis_rdf::{Iri, NamedOrBlank, Quad, Term};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Read,
    Write,
    Append,
    Control,
}

impl Mode {
    fn from_iri(iri: &Iri) -> Option<Self> {
        if *iri == *vocab::ACL_READ {
            Some(Self::Read)
        } else if *iri == *vocab::ACL_WRITE {
            Some(Self::Write)
        } else if *iri == *vocab::ACL_APPEND {
            Some(Self::Append)
        } else if *iri == *vocab::ACL_CONTROL {
            Some(Self::Control)
        } else {
            None
        }
    }
}

/// One `acl:Authorization` rule, as parsed from the quads sharing its subject.
#[derive(Clone, Debug, Default)]
pub struct Authorization {
    pub agents: Vec<Iri>,
    pub agent_classes: Vec<Iri>,
    pub agent_groups: Vec<Iri>,
    pub access_to: Vec<Iri>,
    pub default_for: Vec<Iri>,
    pub modes: HashSet<Mode>,
}

/// Groups ACL quads by subject and keeps only the subjects typed
/// `acl:Authorization`.
pub fn parse_authorizations(acl_quads: &[Quad]) -> Vec<Authorization> {
    let mut by_subject: HashMap<&NamedOrBlank, Vec<&Quad>> = HashMap::new();
    for quad in acl_quads {
        by_subject.entry(&quad.subject).or_default().push(quad);
    }

    by_subject
        .into_values()
        .filter_map(|quads| {
            let is_authorization = quads
                .iter()
                .any(|q| q.predicate == *vocab::RDF_TYPE && matches!(&q.object, Term::Iri(t) if *t == *vocab::ACL_AUTHORIZATION));
            if !is_authorization {
                return None;
            }
            let mut authorization = Authorization::default();
            for quad in quads {
                let Term::Iri(object) = &quad.object else { continue };
                if quad.predicate == *vocab::ACL_AGENT {
                    authorization.agents.push(object.clone());
                } else if quad.predicate == *vocab::ACL_AGENT_CLASS {
                    authorization.agent_classes.push(object.clone());
                } else if quad.predicate == *vocab::ACL_AGENT_GROUP {
                    authorization.agent_groups.push(object.clone());
                } else if quad.predicate == *vocab::ACL_ACCESS_TO {
                    authorization.access_to.push(object.clone());
                } else if quad.predicate == *vocab::ACL_DEFAULT {
                    authorization.default_for.push(object.clone());
                } else if quad.predicate == *vocab::ACL_MODE {
                    if let Some(mode) = Mode::from_iri(object) {
                        authorization.modes.insert(mode);
                    }
                }
            }
            Some(authorization)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_rdf::quad::graphs;

    #[test]
    fn parses_one_authorization_with_multiple_modes() {
        let subject = Iri::new("trellis:data/acl#auth1");
        let quads = vec![
            Quad::new(graphs::ACCESS_CONTROL.clone(), subject.clone(), vocab::RDF_TYPE.clone(), Term::Iri(vocab::ACL_AUTHORIZATION.clone())),
            Quad::new(graphs::ACCESS_CONTROL.clone(), subject.clone(), vocab::ACL_AGENT.clone(), Term::Iri(Iri::new("http://example.org/alice"))),
            Quad::new(graphs::ACCESS_CONTROL.clone(), subject.clone(), vocab::ACL_ACCESS_TO.clone(), Term::Iri(Iri::new("trellis:data/res1"))),
            Quad::new(graphs::ACCESS_CONTROL.clone(), subject.clone(), vocab::ACL_MODE.clone(), Term::Iri(vocab::ACL_READ.clone())),
            Quad::new(graphs::ACCESS_CONTROL.clone(), subject, vocab::ACL_MODE.clone(), Term::Iri(vocab::ACL_WRITE.clone())),
        ];

        let authorizations = parse_authorizations(&quads);
        assert_eq!(authorizations.len(), 1);
        assert_eq!(authorizations[0].modes.len(), 2);
        assert!(authorizations[0].modes.contains(&Mode::Read));
    }

    #[test]
    fn ignores_subjects_that_are_not_authorizations() {
        let subject = Iri::new("trellis:data/res1");
        let quads = vec![Quad::new(
            graphs::USER_MANAGED.clone(),
            subject,
            vocab::DC_TITLE.clone(),
            Term::Iri(Iri::new("http://example.org/not-an-authorization")),
        )];
        assert!(parse_authorizations(&quads).is_empty());
    }
}
