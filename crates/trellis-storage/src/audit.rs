//! C5: the audit log driver (spec.md §4.5). An append-only record of every write
//! against a resource, stored in the `PreferAudit` named graph and joined in at
//! read time when a client asks for it via `Prefer`. An audit write must never be
//! allowed to fail the request it is recording — callers log and continue rather
//! than propagate (spec.md §4.5 invariant).

use crate::error::StorageResult;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use trellis_rdf::layout::{resource_path, LayoutConfig};
use trellis_rdf::nquads::{parse_nquads, write_nquads};
use trellis_rdf::Quad;

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn add(&self, id: &str, quads: &[Quad]) -> StorageResult<()>;

    async fn read(&self, id: &str) -> StorageResult<Vec<Quad>>;
}

pub struct FileAuditStore {
    base_path: PathBuf,
    layout: LayoutConfig,
}

impl FileAuditStore {
    pub fn new(base_path: impl Into<PathBuf>, layout: LayoutConfig) -> Self {
        Self { base_path: base_path.into(), layout }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.base_path.join(resource_path(id, self.layout)).join("audit.nq")
    }
}

#[async_trait]
impl AuditStore for FileAuditStore {
    async fn add(&self, id: &str, quads: &[Quad]) -> StorageResult<()> {
        let path = self.path_for(id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(write_nquads(quads).as_bytes()).await?;
        Ok(())
    }

    async fn read(&self, id: &str) -> StorageResult<Vec<Quad>> {
        let path = self.path_for(id);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(parse_nquads(&content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Always reports an empty audit trail and silently drops writes. Used when a
/// deployment has no durable audit sink configured; per spec.md §4.5 the absence
/// of audit support must never surface as an error to callers.
pub struct NullAuditStore;

#[async_trait]
impl AuditStore for NullAuditStore {
    async fn add(&self, _id: &str, _quads: &[Quad]) -> StorageResult<()> {
        Ok(())
    }

    async fn read(&self, _id: &str) -> StorageResult<Vec<Quad>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_rdf::{Iri, Literal, Term};

    fn sample_quad() -> Quad {
        Quad::new(
            Iri::new("http://www.trellisldp.org/ns/trellis#PreferAudit"),
            Iri::new("trellis:data/res1"),
            Iri::new("http://www.w3.org/ns/prov#wasGeneratedBy"),
            Term::Literal(Literal::plain("create")),
        )
    }

    #[tokio::test]
    async fn add_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAuditStore::new(dir.path(), LayoutConfig::default());
        store.add("res1", &[sample_quad()]).await.unwrap();

        let read = store.read("res1").await.unwrap();
        assert_eq!(read, vec![sample_quad()]);
    }

    #[tokio::test]
    async fn add_appends_rather_than_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAuditStore::new(dir.path(), LayoutConfig::default());
        store.add("res1", &[sample_quad()]).await.unwrap();
        store.add("res1", &[sample_quad()]).await.unwrap();

        assert_eq!(store.read("res1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn read_of_unwritten_resource_is_empty_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAuditStore::new(dir.path(), LayoutConfig::default());
        assert_eq!(store.read("never-written").await.unwrap(), Vec::new());
    }

    #[tokio::test]
    async fn null_store_never_fails_and_never_remembers() {
        let store = NullAuditStore;
        store.add("res1", &[sample_quad()]).await.unwrap();
        assert_eq!(store.read("res1").await.unwrap(), Vec::new());
    }
}
