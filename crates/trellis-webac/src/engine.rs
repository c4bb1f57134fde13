//! C9: the WebAC authorization engine (spec.md §4.6). Walks up from a target
//! resource to the nearest ancestor carrying a non-empty ACL, evaluates which
//! `acl:Authorization` rules apply to `agent`, and unions their modes.

use crate::authorization::{parse_authorizations, Mode};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant as StdInstant};
use trellis_rdf::quad::{graphs, vocab};
use trellis_rdf::{Iri, ResourceState, Term};
use trellis_storage::Repository;

#[async_trait]
pub trait WebAcEngine: Send + Sync {
    /// The set of modes `agent` (`None` for an anonymous caller) holds over
    /// `target`. An empty set denies the request.
    async fn modes(&self, target: &Iri, agent: Option<&Iri>) -> HashSet<Mode>;

    /// Drops every cached entry for `target`; called after any ACL mutation.
    fn invalidate(&self, target: &Iri);
}

struct CacheEntry {
    modes: HashSet<Mode>,
    expires_at: StdInstant,
}

pub struct AclWebAcEngine {
    repository: Arc<Repository>,
    admin_agents: HashSet<Iri>,
    cache: DashMap<(Iri, Option<Iri>), CacheEntry>,
    cache_ttl: Duration,
}

impl AclWebAcEngine {
    pub fn new(repository: Arc<Repository>, admin_agents: HashSet<Iri>, cache_ttl: Duration) -> Self {
        Self { repository, admin_agents, cache: DashMap::new(), cache_ttl }
    }

    /// Internal identifiers are slash-delimited under `trellis:data/`; walking up
    /// means trimming the last non-empty path segment.
    fn parent_of(id: &str) -> Option<String> {
        let trimmed = id.strip_suffix('/').unwrap_or(id);
        let without_root = trimmed.strip_prefix("trellis:data/")?;
        if without_root.is_empty() {
            return None;
        }
        match without_root.rfind('/') {
            Some(idx) => Some(format!("trellis:data/{}", &without_root[..idx])),
            None => Some("trellis:data/".to_string()),
        }
    }

    async fn agent_is_group_member(&self, group: &Iri, agent: &Iri) -> bool {
        match self.repository.get(group.as_str()).await {
            Ok(ResourceState::Present(resource)) => resource.all_quads().any(|q| {
                q.predicate == *vocab::VCARD_HAS_MEMBER && matches!(&q.object, Term::Iri(member) if member == agent)
            }),
            _ => false,
        }
    }

    async fn find_acl_resource(&self, target: &str) -> Option<(String, trellis_rdf::Resource)> {
        let mut current = target.to_string();
        loop {
            if let Ok(ResourceState::Present(resource)) = self.repository.get(&current).await {
                if resource.has_acl {
                    return Some((current, resource));
                }
            }
            current = Self::parent_of(&current)?;
        }
    }

    async fn rule_applies(&self, rule: &crate::authorization::Authorization, agent: Option<&Iri>) -> bool {
        let agent_matches = match agent {
            Some(agent) => {
                if rule.agents.iter().any(|a| a == agent) {
                    true
                } else if rule.agent_classes.iter().any(|c| *c == *vocab::ACL_AUTHENTICATED_AGENT) {
                    true
                } else if rule.agent_classes.iter().any(|c| *c == *vocab::FOAF_AGENT) {
                    true
                } else {
                    let mut matched = false;
                    for group in &rule.agent_groups {
                        if self.agent_is_group_member(group, agent).await {
                            matched = true;
                            break;
                        }
                    }
                    matched
                }
            }
            None => rule.agent_classes.iter().any(|c| *c == *vocab::FOAF_AGENT),
        };
        agent_matches
    }

    fn cache_get(&self, key: &(Iri, Option<Iri>)) -> Option<HashSet<Mode>> {
        let entry = self.cache.get(key)?;
        if entry.expires_at < StdInstant::now() {
            return None;
        }
        Some(entry.modes.clone())
    }

    fn cache_put(&self, key: (Iri, Option<Iri>), modes: HashSet<Mode>) {
        self.cache.insert(key, CacheEntry { modes, expires_at: StdInstant::now() + self.cache_ttl });
    }
}

#[async_trait]
impl WebAcEngine for AclWebAcEngine {
    async fn modes(&self, target: &Iri, agent: Option<&Iri>) -> HashSet<Mode> {
        if let Some(agent) = agent {
            if self.admin_agents.contains(agent) {
                return [Mode::Read, Mode::Write, Mode::Append, Mode::Control].into_iter().collect();
            }
        }

        let cache_key = (target.clone(), agent.cloned());
        if let Some(cached) = self.cache_get(&cache_key) {
            return cached;
        }

        let Some((acl_resource_id, acl_resource)) = self.find_acl_resource(target.as_str()).await else {
            return HashSet::new();
        };
        let acl_quads = acl_resource.graph(&graphs::ACCESS_CONTROL);
        let authorizations = parse_authorizations(acl_quads);
        let is_self = acl_resource_id == target.as_str();
        let acl_resource_iri = Iri::new(acl_resource_id);

        let mut modes = HashSet::new();
        for rule in &authorizations {
            let target_matches = if is_self {
                rule.access_to.iter().any(|t| t == target) || rule.default_for.iter().any(|t| *t == acl_resource_iri)
            } else {
                rule.default_for.iter().any(|t| *t == acl_resource_iri)
            };
            if !target_matches {
                continue;
            }
            if self.rule_applies(rule, agent).await {
                modes.extend(rule.modes.iter().copied());
            }
        }

        self.cache_put(cache_key, modes.clone());
        modes
    }

    fn invalidate(&self, target: &Iri) {
        self.cache.retain(|(cached_target, _), _| cached_target != target);
    }
}

/// Method → required-mode mapping applied by the HTTP layer (spec.md §4.6).
pub fn required_modes(method: &str, is_acl_graph_mutation: bool) -> Vec<Mode> {
    let mut modes = match method {
        "GET" | "HEAD" | "OPTIONS" | "PROPFIND" => vec![Mode::Read],
        "PUT" | "PATCH" | "DELETE" | "PROPPATCH" | "COPY" | "MOVE" => vec![Mode::Write],
        "POST" | "MKCOL" => vec![Mode::Append],
        _ => vec![Mode::Read],
    };
    if is_acl_graph_mutation && !modes.contains(&Mode::Control) {
        modes.push(Mode::Control);
    }
    modes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_of_walks_up_one_segment_at_a_time() {
        assert_eq!(AclWebAcEngine::parent_of("trellis:data/a/b/c"), Some("trellis:data/a/b".to_string()));
        assert_eq!(AclWebAcEngine::parent_of("trellis:data/a"), Some("trellis:data/".to_string()));
        assert_eq!(AclWebAcEngine::parent_of("trellis:data/"), None);
    }

    #[test]
    fn required_modes_match_the_method_table() {
        assert_eq!(required_modes("GET", false), vec![Mode::Read]);
        assert_eq!(required_modes("PUT", false), vec![Mode::Write]);
        assert_eq!(required_modes("POST", false), vec![Mode::Append]);
        assert_eq!(required_modes("PUT", true), vec![Mode::Write, Mode::Control]);
    }
}
