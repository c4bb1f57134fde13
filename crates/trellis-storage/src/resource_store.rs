//! C4: the resource store driver — the authoritative mutable snapshot of a
//! resource's user-managed and server-managed quads (spec.md §4.3). Built on top
//! of the Memento engine (C6): "current state" is simply the most recent
//! snapshot, and every mutation is committed by writing a new one.

use crate::error::{StorageError, StorageResult};
use crate::memento::{MementoStore, SnapshotKind};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use trellis_rdf::quad::{graphs, vocab};
use trellis_rdf::resource::find_iri_object;
use trellis_rdf::{BinaryMeta, Instant, Iri, Literal, NamedOrBlank, Quad, Resource, ResourceState, Term};

const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

/// The server-managed facts a create/replace call supplies; everything else
/// (containment, membership, ACL) is carried forward from the prior snapshot, or
/// populated by the dedicated bookkeeping calls below.
#[derive(Clone, Debug)]
pub struct ResourceMeta {
    pub identifier: Iri,
    pub interaction_model: Iri,
    pub container: Option<Iri>,
    pub binary: Option<BinaryMeta>,
    pub membership_resource: Option<Iri>,
    pub member_relation: Option<Iri>,
    pub member_of_relation: Option<Iri>,
    pub inserted_content_relation: Option<Iri>,
}

#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get(&self, id: &str) -> StorageResult<ResourceState>;

    /// Reconstructs the resource as it stood at `instant` (`is_memento = true`),
    /// for TimeGate/Memento reads.
    async fn get_at(&self, id: &str, instant: Instant) -> StorageResult<ResourceState>;

    /// Fails with `Conflict` if the resource already has a live snapshot.
    async fn create(&self, meta: ResourceMeta, user_quads: Vec<Quad>) -> StorageResult<Resource>;

    /// `expected_modified`, when given, must match the current snapshot's
    /// `modified` or the call fails with `Conflict` (spec.md §5 per-resource CAS).
    async fn replace(
        &self,
        meta: ResourceMeta,
        user_quads: Vec<Quad>,
        expected_modified: Option<Instant>,
    ) -> StorageResult<Resource>;

    async fn delete(&self, id: &str, expected_modified: Option<Instant>) -> StorageResult<()>;

    /// Advances `modified` without changing any quad, used to propagate parent
    /// updates ahead of a child mutation (spec.md §5 "cross-resource ordering").
    async fn touch(&self, id: &str) -> StorageResult<Instant>;

    async fn add_containment(&self, container_id: &str, child: Iri) -> StorageResult<Instant>;

    async fn remove_containment(&self, container_id: &str, child: &Iri) -> StorageResult<Instant>;

    async fn add_membership(&self, membership_resource_id: &str, relation: Iri, member: Iri) -> StorageResult<Instant>;

    async fn remove_membership(&self, membership_resource_id: &str, relation: &Iri, member: &Iri) -> StorageResult<Instant>;

    /// The Memento ranges backing a TimeMap (spec.md §4.4); empty if `id` has
    /// no history at all.
    async fn list_versions(&self, id: &str) -> StorageResult<Vec<crate::memento::MementoRange>>;
}

pub struct FileResourceStore {
    memento: Arc<dyn MementoStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FileResourceStore {
    pub fn new(memento: Arc<dyn MementoStore>) -> Self {
        Self { memento, locks: DashMap::new() }
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        self.locks.entry(id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    async fn snapshot_at_now(&self, id: &str) -> StorageResult<ResourceState> {
        self.read_at(id, Instant::now(), false).await
    }

    async fn read_at(&self, id: &str, instant: Instant, is_memento: bool) -> StorageResult<ResourceState> {
        match self.memento.get(id, instant).await? {
            None => Ok(ResourceState::Missing),
            Some(snapshot) => match snapshot.kind {
                SnapshotKind::Tombstone => Ok(ResourceState::Deleted),
                SnapshotKind::Data(quads) => {
                    let identifier = Iri::new(id.to_string());
                    Ok(ResourceState::Present(resource_from_quads(&identifier, quads, snapshot.instant, is_memento)))
                }
            },
        }
    }

    /// Writes a full snapshot for `meta`, carrying forward `preserved_graphs`
    /// (containment/membership/ACL) unless the caller overrides them.
    async fn commit(
        &self,
        meta: ResourceMeta,
        user_quads: Vec<Quad>,
        containment_quads: Vec<Quad>,
        membership_quads: Vec<Quad>,
        acl_quads: Vec<Quad>,
        not_before: Option<Instant>,
    ) -> StorageResult<Resource> {
        let mut now = Instant::now();
        if let Some(prev) = not_before {
            if now.epoch_seconds() <= prev.epoch_seconds() {
                now = Instant::from_epoch_seconds(prev.epoch_seconds() + 1);
            }
        }
        let resource = build_resource(&meta, user_quads, now, false, containment_quads, membership_quads, acl_quads);
        let quads: Vec<Quad> = resource.all_quads().cloned().collect();
        self.memento.put(meta.identifier.as_str(), now, quads).await?;
        Ok(resource)
    }

    async fn carried_graphs(&self, id: &str) -> StorageResult<(Vec<Quad>, Vec<Quad>, Vec<Quad>, Option<Instant>)> {
        match self.snapshot_at_now(id).await? {
            ResourceState::Present(r) => Ok((
                r.graph(&graphs::CONTAINMENT).to_vec(),
                r.graph(&graphs::MEMBERSHIP).to_vec(),
                r.graph(&graphs::ACCESS_CONTROL).to_vec(),
                Some(r.modified),
            )),
            _ => Ok((Vec::new(), Vec::new(), Vec::new(), None)),
        }
    }
}

#[async_trait]
impl ResourceStore for FileResourceStore {
    async fn get(&self, id: &str) -> StorageResult<ResourceState> {
        self.snapshot_at_now(id).await
    }

    async fn get_at(&self, id: &str, instant: Instant) -> StorageResult<ResourceState> {
        self.read_at(id, instant, true).await
    }

    async fn create(&self, meta: ResourceMeta, user_quads: Vec<Quad>) -> StorageResult<Resource> {
        let lock = self.lock_for(meta.identifier.as_str());
        let _guard = lock.lock().await;
        if let ResourceState::Present(_) = self.snapshot_at_now(meta.identifier.as_str()).await? {
            return Err(StorageError::Conflict(format!("{} already exists", meta.identifier)));
        }
        self.commit(meta, user_quads, Vec::new(), Vec::new(), Vec::new(), None).await
    }

    async fn replace(
        &self,
        meta: ResourceMeta,
        user_quads: Vec<Quad>,
        expected_modified: Option<Instant>,
    ) -> StorageResult<Resource> {
        let lock = self.lock_for(meta.identifier.as_str());
        let _guard = lock.lock().await;
        let (containment, membership, acl, actual_modified) = self.carried_graphs(meta.identifier.as_str()).await?;
        if let Some(expected) = expected_modified {
            if actual_modified != Some(expected) {
                return Err(StorageError::Conflict(format!(
                    "expected modified {:?}, found {:?}",
                    expected.epoch_seconds(),
                    actual_modified.map(Instant::epoch_seconds)
                )));
            }
        }
        self.commit(meta, user_quads, containment, membership, acl, actual_modified).await
    }

    async fn delete(&self, id: &str, expected_modified: Option<Instant>) -> StorageResult<()> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;
        let current = self.snapshot_at_now(id).await?;
        let actual_modified = current.as_present().map(|r| r.modified);
        if let Some(expected) = expected_modified {
            if actual_modified != Some(expected) {
                return Err(StorageError::Conflict(format!("{id} was modified concurrently")));
            }
        }
        let mut now = Instant::now();
        if let Some(prev) = actual_modified {
            if now.epoch_seconds() <= prev.epoch_seconds() {
                now = Instant::from_epoch_seconds(prev.epoch_seconds() + 1);
            }
        }
        self.memento.put_tombstone(id, now).await
    }

    async fn touch(&self, id: &str) -> StorageResult<Instant> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;
        let current = self.snapshot_at_now(id).await?;
        let Some(resource) = current.as_present() else {
            return Err(StorageError::NotFound(id.to_string()));
        };
        let meta = meta_from_resource(resource);
        let user_quads = resource.graph(&graphs::USER_MANAGED).to_vec();
        let containment = resource.graph(&graphs::CONTAINMENT).to_vec();
        let membership = resource.graph(&graphs::MEMBERSHIP).to_vec();
        let acl = resource.graph(&graphs::ACCESS_CONTROL).to_vec();
        let modified = resource.modified;
        let committed = self.commit(meta, user_quads, containment, membership, acl, Some(modified)).await?;
        Ok(committed.modified)
    }

    async fn add_containment(&self, container_id: &str, child: Iri) -> StorageResult<Instant> {
        let lock = self.lock_for(container_id);
        let _guard = lock.lock().await;
        let current = self.snapshot_at_now(container_id).await?;
        let Some(resource) = current.as_present() else {
            return Err(StorageError::NotFound(container_id.to_string()));
        };
        let meta = meta_from_resource(resource);
        let user_quads = resource.graph(&graphs::USER_MANAGED).to_vec();
        let membership = resource.graph(&graphs::MEMBERSHIP).to_vec();
        let acl = resource.graph(&graphs::ACCESS_CONTROL).to_vec();
        let mut containment = resource.graph(&graphs::CONTAINMENT).to_vec();
        containment.push(Quad::new(
            graphs::CONTAINMENT.clone(),
            meta.identifier.clone(),
            vocab::LDP_CONTAINS.clone(),
            Term::Iri(child),
        ));
        let modified = resource.modified;
        let committed = self.commit(meta, user_quads, containment, membership, acl, Some(modified)).await?;
        Ok(committed.modified)
    }

    async fn remove_containment(&self, container_id: &str, child: &Iri) -> StorageResult<Instant> {
        let lock = self.lock_for(container_id);
        let _guard = lock.lock().await;
        let current = self.snapshot_at_now(container_id).await?;
        let Some(resource) = current.as_present() else {
            return Err(StorageError::NotFound(container_id.to_string()));
        };
        let meta = meta_from_resource(resource);
        let user_quads = resource.graph(&graphs::USER_MANAGED).to_vec();
        let membership = resource.graph(&graphs::MEMBERSHIP).to_vec();
        let acl = resource.graph(&graphs::ACCESS_CONTROL).to_vec();
        let containment: Vec<Quad> = resource
            .graph(&graphs::CONTAINMENT)
            .iter()
            .filter(|q| !matches!(&q.object, Term::Iri(iri) if iri == child))
            .cloned()
            .collect();
        let modified = resource.modified;
        let committed = self.commit(meta, user_quads, containment, membership, acl, Some(modified)).await?;
        Ok(committed.modified)
    }

    async fn add_membership(&self, membership_resource_id: &str, relation: Iri, member: Iri) -> StorageResult<Instant> {
        let lock = self.lock_for(membership_resource_id);
        let _guard = lock.lock().await;
        let current = self.snapshot_at_now(membership_resource_id).await?;
        let Some(resource) = current.as_present() else {
            return Err(StorageError::NotFound(membership_resource_id.to_string()));
        };
        let meta = meta_from_resource(resource);
        let user_quads = resource.graph(&graphs::USER_MANAGED).to_vec();
        let containment = resource.graph(&graphs::CONTAINMENT).to_vec();
        let acl = resource.graph(&graphs::ACCESS_CONTROL).to_vec();
        let mut membership = resource.graph(&graphs::MEMBERSHIP).to_vec();
        membership.push(Quad::new(
            graphs::MEMBERSHIP.clone(),
            meta.identifier.clone(),
            relation,
            Term::Iri(member),
        ));
        let modified = resource.modified;
        let committed = self.commit(meta, user_quads, containment, membership, acl, Some(modified)).await?;
        Ok(committed.modified)
    }

    async fn remove_membership(&self, membership_resource_id: &str, relation: &Iri, member: &Iri) -> StorageResult<Instant> {
        let lock = self.lock_for(membership_resource_id);
        let _guard = lock.lock().await;
        let current = self.snapshot_at_now(membership_resource_id).await?;
        let Some(resource) = current.as_present() else {
            return Err(StorageError::NotFound(membership_resource_id.to_string()));
        };
        let meta = meta_from_resource(resource);
        let user_quads = resource.graph(&graphs::USER_MANAGED).to_vec();
        let containment = resource.graph(&graphs::CONTAINMENT).to_vec();
        let acl = resource.graph(&graphs::ACCESS_CONTROL).to_vec();
        let membership: Vec<Quad> = resource
            .graph(&graphs::MEMBERSHIP)
            .iter()
            .filter(|q| !(q.predicate == *relation && matches!(&q.object, Term::Iri(iri) if iri == member)))
            .cloned()
            .collect();
        let modified = resource.modified;
        let committed = self.commit(meta, user_quads, containment, membership, acl, Some(modified)).await?;
        Ok(committed.modified)
    }

    async fn list_versions(&self, id: &str) -> StorageResult<Vec<crate::memento::MementoRange>> {
        self.memento.list(id, Instant::now()).await
    }
}

fn meta_from_resource(resource: &Resource) -> ResourceMeta {
    ResourceMeta {
        identifier: resource.identifier.clone(),
        interaction_model: resource.interaction_model.clone(),
        container: resource.container.clone(),
        binary: resource.binary.clone(),
        membership_resource: resource.membership_resource.clone(),
        member_relation: resource.member_relation.clone(),
        member_of_relation: resource.member_of_relation.clone(),
        inserted_content_relation: resource.inserted_content_relation.clone(),
    }
}

/// Assembles the full per-graph quad set for a snapshot: user-managed quads as
/// given, server-managed quads recomputed from `meta`, and the containment/
/// membership/ACL graphs passed through unchanged from whatever the caller
/// decided to carry forward.
fn build_resource(
    meta: &ResourceMeta,
    user_quads: Vec<Quad>,
    modified: Instant,
    is_memento: bool,
    containment_quads: Vec<Quad>,
    membership_quads: Vec<Quad>,
    acl_quads: Vec<Quad>,
) -> Resource {
    let mut server_quads = vec![
        Quad::new(
            graphs::SERVER_MANAGED.clone(),
            meta.identifier.clone(),
            vocab::RDF_TYPE.clone(),
            Term::Iri(meta.interaction_model.clone()),
        ),
        Quad::new(
            graphs::SERVER_MANAGED.clone(),
            meta.identifier.clone(),
            vocab::DC_MODIFIED.clone(),
            Term::Literal(Literal::typed(modified.epoch_seconds().to_string(), Iri::new(XSD_DATE_TIME))),
        ),
    ];
    if let Some(container) = &meta.container {
        server_quads.push(Quad::new(
            graphs::SERVER_MANAGED.clone(),
            meta.identifier.clone(),
            vocab::DC_IS_PART_OF.clone(),
            Term::Iri(container.clone()),
        ));
    }
    if let Some(binary) = &meta.binary {
        let binary_iri = Iri::new(binary.id.clone());
        server_quads.push(Quad::new(
            graphs::SERVER_MANAGED.clone(),
            meta.identifier.clone(),
            vocab::DC_HAS_PART.clone(),
            Term::Iri(binary_iri.clone()),
        ));
        if let Some(mime) = &binary.mime_type {
            server_quads.push(Quad::new(
                graphs::SERVER_MANAGED.clone(),
                binary_iri.clone(),
                vocab::DC_FORMAT.clone(),
                Term::Literal(Literal::plain(mime.clone())),
            ));
        }
        if let Some(size) = binary.size {
            server_quads.push(Quad::new(
                graphs::SERVER_MANAGED.clone(),
                binary_iri,
                vocab::DC_EXTENT.clone(),
                Term::Literal(Literal::typed(size.to_string(), Iri::new(XSD_INTEGER))),
            ));
        }
    }
    if let Some(resource) = &meta.membership_resource {
        server_quads.push(Quad::new(
            graphs::SERVER_MANAGED.clone(),
            meta.identifier.clone(),
            vocab::LDP_MEMBERSHIP_RESOURCE.clone(),
            Term::Iri(resource.clone()),
        ));
    }
    if let Some(relation) = &meta.member_relation {
        server_quads.push(Quad::new(
            graphs::SERVER_MANAGED.clone(),
            meta.identifier.clone(),
            vocab::LDP_HAS_MEMBER_RELATION.clone(),
            Term::Iri(relation.clone()),
        ));
    }
    if let Some(relation) = &meta.member_of_relation {
        server_quads.push(Quad::new(
            graphs::SERVER_MANAGED.clone(),
            meta.identifier.clone(),
            vocab::LDP_IS_MEMBER_OF_RELATION.clone(),
            Term::Iri(relation.clone()),
        ));
    }
    if let Some(relation) = &meta.inserted_content_relation {
        server_quads.push(Quad::new(
            graphs::SERVER_MANAGED.clone(),
            meta.identifier.clone(),
            vocab::LDP_INSERTED_CONTENT_RELATION.clone(),
            Term::Iri(relation.clone()),
        ));
    }

    Resource::builder(meta.identifier.clone(), meta.interaction_model.clone(), modified)
        .container(meta.container.clone())
        .binary(meta.binary.clone())
        .membership(
            meta.membership_resource.clone(),
            meta.member_relation.clone(),
            meta.member_of_relation.clone(),
            meta.inserted_content_relation.clone(),
        )
        .is_memento(is_memento)
        .with_graph(graphs::USER_MANAGED.clone(), user_quads)
        .with_graph(graphs::SERVER_MANAGED.clone(), server_quads)
        .with_graph(graphs::CONTAINMENT.clone(), containment_quads)
        .with_graph(graphs::MEMBERSHIP.clone(), membership_quads)
        .with_graph(graphs::ACCESS_CONTROL.clone(), acl_quads)
        .build()
}

/// Inverse of `build_resource`: partitions a flat quad set by named graph and
/// derives the server-managed fields back out of it.
fn resource_from_quads(identifier: &Iri, quads: Vec<Quad>, modified: Instant, is_memento: bool) -> Resource {
    let mut by_graph: HashMap<Iri, Vec<Quad>> = HashMap::new();
    for quad in quads {
        if let NamedOrBlank::Iri(graph) = &quad.graph {
            by_graph.entry(graph.clone()).or_default().push(quad);
        }
    }
    let user_quads = by_graph.remove(&*graphs::USER_MANAGED).unwrap_or_default();
    let server_quads = by_graph.remove(&*graphs::SERVER_MANAGED).unwrap_or_default();
    let containment_quads = by_graph.remove(&*graphs::CONTAINMENT).unwrap_or_default();
    let membership_quads = by_graph.remove(&*graphs::MEMBERSHIP).unwrap_or_default();
    let acl_quads = by_graph.remove(&*graphs::ACCESS_CONTROL).unwrap_or_default();

    let interaction_model = find_iri_object(&server_quads, &vocab::RDF_TYPE)
        .cloned()
        .unwrap_or_else(|| vocab::LDP_RESOURCE.clone());
    let container = find_iri_object(&server_quads, &vocab::DC_IS_PART_OF).cloned();
    let membership_resource = find_iri_object(&server_quads, &vocab::LDP_MEMBERSHIP_RESOURCE).cloned();
    let member_relation = find_iri_object(&server_quads, &vocab::LDP_HAS_MEMBER_RELATION).cloned();
    let member_of_relation = find_iri_object(&server_quads, &vocab::LDP_IS_MEMBER_OF_RELATION).cloned();
    let inserted_content_relation = find_iri_object(&server_quads, &vocab::LDP_INSERTED_CONTENT_RELATION).cloned();

    let binary = find_iri_object(&server_quads, &vocab::DC_HAS_PART).cloned().map(|binary_iri| {
        let mime_type = server_quads
            .iter()
            .find(|q| q.subject == NamedOrBlank::Iri(binary_iri.clone()) && q.predicate == *vocab::DC_FORMAT)
            .and_then(|q| match &q.object {
                Term::Literal(l) => Some(l.lexical.to_string()),
                _ => None,
            });
        let size = server_quads
            .iter()
            .find(|q| q.subject == NamedOrBlank::Iri(binary_iri.clone()) && q.predicate == *vocab::DC_EXTENT)
            .and_then(|q| match &q.object {
                Term::Literal(l) => l.lexical.parse::<u64>().ok(),
                _ => None,
            });
        BinaryMeta { id: binary_iri.as_str().to_string(), modified, mime_type, size }
    });

    Resource::builder(identifier.clone(), interaction_model, modified)
        .container(container)
        .binary(binary)
        .membership(membership_resource, member_relation, member_of_relation, inserted_content_relation)
        .is_memento(is_memento)
        .with_graph(graphs::USER_MANAGED.clone(), user_quads)
        .with_graph(graphs::SERVER_MANAGED.clone(), server_quads)
        .with_graph(graphs::CONTAINMENT.clone(), containment_quads)
        .with_graph(graphs::MEMBERSHIP.clone(), membership_quads)
        .with_graph(graphs::ACCESS_CONTROL.clone(), acl_quads)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memento::FileMementoStore;
    use trellis_rdf::layout::LayoutConfig;

    fn store() -> (tempfile::TempDir, FileResourceStore) {
        let dir = tempfile::tempdir().unwrap();
        let memento = Arc::new(FileMementoStore::new(dir.path(), LayoutConfig::default()));
        (dir, FileResourceStore::new(memento))
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
    async fn missing_resource_reports_missing() {
        let (_dir, store) = store();
        assert!(matches!(store.get("trellis:data/nope").await.unwrap(), ResourceState::Missing));
    }

    #[tokio::test]
    async fn create_then_get_round_trips_user_quads() {
        let (_dir, store) = store();
        let id = "trellis:data/res1";
        let title = Quad::new(
            graphs::USER_MANAGED.clone(),
            Iri::new(id),
            vocab::DC_TITLE.clone(),
            Term::Literal(Literal::plain("hello")),
        );
        store.create(meta(id), vec![title.clone()]).await.unwrap();

        let fetched = store.get(id).await.unwrap();
        let resource = fetched.as_present().unwrap();
        assert_eq!(resource.graph(&graphs::USER_MANAGED), &[title]);
    }

    #[tokio::test]
    async fn create_twice_conflicts() {
        let (_dir, store) = store();
        let id = "trellis:data/res1";
        store.create(meta(id), vec![]).await.unwrap();
        assert!(matches!(store.create(meta(id), vec![]).await, Err(StorageError::Conflict(_))));
    }

    #[tokio::test]
    async fn replace_with_stale_expected_modified_conflicts() {
        let (_dir, store) = store();
        let id = "trellis:data/res1";
        let created = store.create(meta(id), vec![]).await.unwrap();
        let stale = Instant::from_epoch_seconds(created.modified.epoch_seconds() - 1);
        assert!(matches!(
            store.replace(meta(id), vec![], Some(stale)).await,
            Err(StorageError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn delete_then_get_reports_deleted() {
        let (_dir, store) = store();
        let id = "trellis:data/res1";
        store.create(meta(id), vec![]).await.unwrap();
        store.delete(id, None).await.unwrap();
        assert!(matches!(store.get(id).await.unwrap(), ResourceState::Deleted));
    }

    #[tokio::test]
    async fn add_containment_is_visible_on_next_get() {
        let (_dir, store) = store();
        let container_id = "trellis:data/container1";
        let mut container_meta = meta(container_id);
        container_meta.interaction_model = vocab::LDP_BASIC_CONTAINER.clone();
        store.create(container_meta, vec![]).await.unwrap();

        store.add_containment(container_id, Iri::new("trellis:data/container1/child1")).await.unwrap();

        let resource = store.get(container_id).await.unwrap().as_present().unwrap().clone();
        assert_eq!(resource.graph(&graphs::CONTAINMENT).len(), 1);
    }

    #[tokio::test]
    async fn touch_advances_modified_without_changing_quads() {
        let (_dir, store) = store();
        let id = "trellis:data/res1";
        let created = store.create(meta(id), vec![]).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        let touched = store.touch(id).await.unwrap();
        assert!(touched.epoch_seconds() >= created.modified.epoch_seconds());
    }
}
