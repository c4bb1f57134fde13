//! The public storage facade apps/server talks to: joins C4 (resource store)
//! with C5 (audit store) on read, and exposes the six-operation contract spec.md
//! §4.3 calls out at the top of "Resource Store (C4) and Audit Store (C5)" —
//! `get/create/replace/delete/touch/add`.

use crate::audit::AuditStore;
use crate::error::StorageResult;
use crate::resource_store::{ResourceMeta, ResourceStore};
use std::sync::Arc;
use trellis_rdf::quad::graphs;
use trellis_rdf::{Instant, Quad, ResourceState};

pub struct Repository {
    resources: Arc<dyn ResourceStore>,
    audit: Arc<dyn AuditStore>,
}

impl Repository {
    pub fn new(resources: Arc<dyn ResourceStore>, audit: Arc<dyn AuditStore>) -> Self {
        Self { resources, audit }
    }

    pub fn resources(&self) -> &Arc<dyn ResourceStore> {
        &self.resources
    }

    async fn joined(&self, id: &str, state: ResourceState) -> StorageResult<ResourceState> {
        match state {
            ResourceState::Present(resource) => {
                let audit_quads = self.audit.read(id).await?;
                Ok(ResourceState::Present(resource.with_extra_graph(graphs::AUDIT.clone(), audit_quads)))
            }
            other => Ok(other),
        }
    }

    pub async fn get(&self, id: &str) -> StorageResult<ResourceState> {
        let state = self.resources.get(id).await?;
        self.joined(id, state).await
    }

    pub async fn get_at(&self, id: &str, instant: Instant) -> StorageResult<ResourceState> {
        let state = self.resources.get_at(id, instant).await?;
        self.joined(id, state).await
    }

    pub async fn create(&self, meta: ResourceMeta, user_quads: Vec<Quad>) -> StorageResult<ResourceState> {
        let id = meta.identifier.as_str().to_string();
        let resource = self.resources.create(meta, user_quads).await?;
        self.joined(&id, ResourceState::Present(resource)).await
    }

    pub async fn replace(
        &self,
        meta: ResourceMeta,
        user_quads: Vec<Quad>,
        expected_modified: Option<Instant>,
    ) -> StorageResult<ResourceState> {
        let id = meta.identifier.as_str().to_string();
        let resource = self.resources.replace(meta, user_quads, expected_modified).await?;
        self.joined(&id, ResourceState::Present(resource)).await
    }

    pub async fn delete(&self, id: &str, expected_modified: Option<Instant>) -> StorageResult<()> {
        self.resources.delete(id, expected_modified).await
    }

    pub async fn touch(&self, id: &str) -> StorageResult<Instant> {
        self.resources.touch(id).await
    }

    pub async fn list_versions(&self, id: &str) -> StorageResult<Vec<crate::memento::MementoRange>> {
        self.resources.list_versions(id).await
    }

    /// Appends immutable quads to the audit trail; never observable as a failure
    /// to the caller's primary mutation (spec.md §4.3, §5 "Audit + Memento").
    pub async fn add(&self, id: &str, immutable_quads: &[Quad]) {
        if let Err(err) = self.audit.add(id, immutable_quads).await {
            tracing::error!(%id, %err, "failed to append audit record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::FileAuditStore;
    use crate::memento::FileMementoStore;
    use crate::resource_store::FileResourceStore;
    use trellis_rdf::layout::LayoutConfig;
    use trellis_rdf::quad::vocab;
    use trellis_rdf::{Iri, Literal, Term};

    fn repository() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let memento = Arc::new(FileMementoStore::new(dir.path(), LayoutConfig::default()));
        let resources: Arc<dyn ResourceStore> = Arc::new(FileResourceStore::new(memento));
        let audit: Arc<dyn AuditStore> = Arc::new(FileAuditStore::new(dir.path(), LayoutConfig::default()));
        (dir, Repository::new(resources, audit))
    }

    fn meta(id: &str) -> ResourceMeta {
        ResourceMeta {
            identifier: Iri::new(id.to_string()),
            interaction_model: vocab::LDP_RDF_SOURCE.clone(),
            container: None,
            binary: None,
            membership_resource: None,
            member_relation: None,
            member_of_relation: None,
            inserted_content_relation: None,
        }
    }

    #[tokio::test]
    async fn get_joins_audit_quads_into_the_prefer_audit_graph() {
        let (_dir, repo) = repository();
        let id = "trellis:data/res1";
        repo.create(meta(id), vec![]).await.unwrap();
        let event = Quad::new(
            graphs::AUDIT.clone(),
            Iri::new(id),
            vocab::PROV_ACTIVITY.clone(),
            Term::Literal(Literal::plain("create")),
        );
        repo.add(id, &[event.clone()]).await;

        let state = repo.get(id).await.unwrap();
        let resource = state.as_present().unwrap();
        assert_eq!(resource.graph(&graphs::AUDIT), &[event]);
    }

    #[tokio::test]
    async fn add_failure_never_surfaces_to_the_caller() {
        let (_dir, repo) = repository();
        // the null-store-equivalent contract: `add` against a resource id that was
        // never created still returns `()`, never an error.
        repo.add("trellis:data/never-created", &[]).await;
    }
}
