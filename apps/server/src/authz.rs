//! Binds `trellis_webac::required_modes` to the HTTP layer: checks the
//! caller's modes over a target and turns a denial into the right status
//! (401 for an anonymous caller, 403 for an authenticated one without
//! sufficient modes -- spec.md §7).

use trellis_rdf::Iri;
use trellis_webac::{required_modes, Mode, WebAcEngine};

use crate::config::Config;
use crate::error::ApiError;

pub async fn authorize(
    webac: &dyn WebAcEngine,
    config: &Config,
    target: &Iri,
    agent: Option<&Iri>,
    method: &str,
    is_acl_graph_mutation: bool,
) -> Result<(), ApiError> {
    let needed = required_modes(method, is_acl_graph_mutation);
    let held: std::collections::HashSet<Mode> = webac.modes(target, agent).await;
    if needed.iter().all(|mode| held.contains(mode)) {
        return Ok(());
    }
    if agent.is_none() {
        Err(ApiError::Unauthorized { realm: config.auth_realm.clone(), scope: config.auth_scope.clone() })
    } else {
        Err(ApiError::Forbidden)
    }
}
