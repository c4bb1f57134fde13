//! Shared application state: the services every handler needs, wired once at
//! startup and cloned (cheaply, via `Arc`) into each request.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use trellis_notify::{BroadcastNotificationEmitter, NotificationEmitter};
use trellis_rdf::Iri;
use trellis_storage::{
    FileAuditStore, FileBinaryStore, FileMementoStore, FileResourceStore, Repository,
};
use trellis_webac::{AclWebAcEngine, WebAcEngine};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repository: Arc<Repository>,
    pub binaries: Arc<FileBinaryStore>,
    pub webac: Arc<dyn WebAcEngine>,
    pub notifications: Arc<dyn NotificationEmitter>,
    pub broadcaster: Arc<BroadcastNotificationEmitter>,
    pub namespaces: Arc<trellis_io::NamespaceService>,
    pub profile_cache: Arc<trellis_io::ProfileCache>,
}

impl AppState {
    pub async fn bootstrap(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.storage_root)?;

        let memento_root = config.storage_root.join("memento");
        let binary_root = config.storage_root.join("binaries");
        let audit_root = config.storage_root.join("audit");
        std::fs::create_dir_all(&memento_root)?;
        std::fs::create_dir_all(&binary_root)?;
        std::fs::create_dir_all(&audit_root)?;

        let memento = Arc::new(FileMementoStore::new(memento_root, Default::default()));
        let resources = Arc::new(FileResourceStore::new(memento));
        let audit = Arc::new(FileAuditStore::new(audit_root, Default::default()));
        let repository = Arc::new(Repository::new(resources, audit));

        ensure_root_container(&repository).await?;

        let binaries = Arc::new(FileBinaryStore::new(binary_root, Default::default()));

        let admin_agents: std::collections::HashSet<Iri> =
            config.admin_users.iter().map(|agent| Iri::new(agent.clone())).collect();
        let webac: Arc<dyn WebAcEngine> = Arc::new(AclWebAcEngine::new(
            repository.clone(),
            admin_agents,
            Duration::from_secs(config.webac_cache_expire_seconds),
        ));

        let broadcaster = Arc::new(BroadcastNotificationEmitter::new(1024));
        let notifications: Arc<dyn NotificationEmitter> = broadcaster.clone();

        let namespaces = Arc::new(trellis_io::NamespaceService::load(config.namespaces_path.clone()).await?);
        let profile_cache = Arc::new(trellis_io::ProfileCache::default());

        Ok(Self {
            config: Arc::new(config),
            repository,
            binaries,
            webac,
            notifications,
            broadcaster,
            namespaces,
            profile_cache,
        })
    }

    pub fn extension_graphs(&self) -> &HashMap<String, String> {
        &self.config.extension_graphs
    }
}

/// Provisions the server root (`trellis:data/`) as an empty `BasicContainer` the
/// first time the store is ever opened, so `POST <base>` has somewhere to land
/// without a client having to `PUT` it first (spec.md §8 scenario 1 assumes the
/// root already exists, as every real LDP deployment's does).
async fn ensure_root_container(repository: &Repository) -> anyhow::Result<()> {
    use trellis_rdf::quad::vocab;

    let root = Iri::new(trellis_rdf::identifier::INTERNAL_PREFIX);
    if repository.get(root.as_str()).await?.as_present().is_some() {
        return Ok(());
    }
    let meta = trellis_storage::ResourceMeta {
        identifier: root,
        interaction_model: vocab::LDP_BASIC_CONTAINER.clone(),
        container: None,
        binary: None,
        membership_resource: None,
        member_relation: None,
        member_of_relation: None,
        inserted_content_relation: None,
    };
    match repository.create(meta, Vec::new()).await {
        Ok(_) => Ok(()),
        Err(trellis_storage::StorageError::Conflict(_)) => Ok(()),
        Err(err) => Err(err.into()),
    }
}
