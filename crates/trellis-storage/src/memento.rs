//! C6: the Memento engine's on-disk snapshot driver (spec.md §4.4).
//!
//! Each resource's history is a set of immutable snapshots keyed by epoch-second,
//! one `<epoch>.nq` file per snapshot under the resource's directory (spec.md §4.1,
//! §6). A deletion is recorded as a same-shaped snapshot carrying no quads, marked
//! with a `.deleted` sidecar so `get`/`list` can tell a tombstone from an empty
//! but live resource.

use crate::error::StorageResult;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use trellis_rdf::layout::{resource_path, LayoutConfig};
use trellis_rdf::nquads::{parse_nquads, write_nquads};
use trellis_rdf::{Instant, Quad};

#[derive(Clone, Debug)]
pub enum SnapshotKind {
    Data(Vec<Quad>),
    Tombstone,
}

#[derive(Clone, Debug)]
pub struct Snapshot {
    pub instant: Instant,
    pub kind: SnapshotKind,
}

/// A half-open `[start, end)` interval one Memento snapshot is valid for — powers
/// the TimeMap and the `Link: rel="memento"` headers (spec.md §4.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MementoRange {
    pub start: Instant,
    pub end: Instant,
}

#[async_trait]
pub trait MementoStore: Send + Sync {
    /// Writes the snapshot for `instant`. Two `put`s resolving to the same
    /// epoch-second collapse into one snapshot; last write wins (spec.md §3
    /// invariant 5, §9 "Open questions").
    async fn put(&self, id: &str, instant: Instant, quads: Vec<Quad>) -> StorageResult<()>;

    async fn put_tombstone(&self, id: &str, instant: Instant) -> StorageResult<()>;

    /// Returns the snapshot whose time is the greatest `<= instant`, or `None` if
    /// `instant` precedes every snapshot (or none exist).
    async fn get(&self, id: &str, instant: Instant) -> StorageResult<Option<Snapshot>>;

    /// Ordered list of `[t_i, t_{i+1})` ranges; the last range's upper bound is
    /// `now`.
    async fn list(&self, id: &str, now: Instant) -> StorageResult<Vec<MementoRange>>;

    async fn delete(&self, id: &str, instant: Instant) -> StorageResult<()>;
}

pub struct FileMementoStore {
    base_path: PathBuf,
    layout: LayoutConfig,
    /// Per-resource lock guarding the small epoch-indexed directory listing so
    /// concurrent writers never observe a torn rename.
    locks: Arc<RwLock<()>>,
}

impl FileMementoStore {
    pub fn new(base_path: impl Into<PathBuf>, layout: LayoutConfig) -> Self {
        Self { base_path: base_path.into(), layout, locks: Arc::new(RwLock::new(())) }
    }

    fn dir_for(&self, id: &str) -> PathBuf {
        self.base_path.join(resource_path(id, self.layout))
    }

    fn data_path(dir: &std::path::Path, epoch: i64) -> PathBuf {
        dir.join(format!("{epoch}.nq"))
    }

    fn tombstone_path(dir: &std::path::Path, epoch: i64) -> PathBuf {
        dir.join(format!("{epoch}.nq.deleted"))
    }

    async fn list_epochs(dir: &std::path::Path) -> StorageResult<BTreeMap<i64, bool>> {
        let mut epochs = BTreeMap::new();
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(epochs),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".nq.deleted") {
                if let Ok(epoch) = stem.parse::<i64>() {
                    epochs.insert(epoch, true);
                }
            } else if let Some(stem) = name.strip_suffix(".nq") {
                if let Ok(epoch) = stem.parse::<i64>() {
                    epochs.entry(epoch).or_insert(false);
                }
            }
        }
        Ok(epochs)
    }
}

#[async_trait]
impl MementoStore for FileMementoStore {
    async fn put(&self, id: &str, instant: Instant, quads: Vec<Quad>) -> StorageResult<()> {
        let _guard = self.locks.write().await;
        let dir = self.dir_for(id);
        tokio::fs::create_dir_all(&dir).await?;
        let path = Self::data_path(&dir, instant.epoch_seconds());
        let tmp = path.with_extension("nq.tmp");
        tokio::fs::write(&tmp, write_nquads(&quads)).await?;
        tokio::fs::rename(&tmp, &path).await?;
        // last write wins: if a tombstone existed for this exact epoch, clear it.
        let _ = tokio::fs::remove_file(Self::tombstone_path(&dir, instant.epoch_seconds())).await;
        Ok(())
    }

    async fn put_tombstone(&self, id: &str, instant: Instant) -> StorageResult<()> {
        let _guard = self.locks.write().await;
        let dir = self.dir_for(id);
        tokio::fs::create_dir_all(&dir).await?;
        let path = Self::tombstone_path(&dir, instant.epoch_seconds());
        tokio::fs::write(&path, b"").await?;
        let _ = tokio::fs::remove_file(Self::data_path(&dir, instant.epoch_seconds())).await;
        Ok(())
    }

    async fn get(&self, id: &str, instant: Instant) -> StorageResult<Option<Snapshot>> {
        let _guard = self.locks.read().await;
        let dir = self.dir_for(id);
        let epochs = Self::list_epochs(&dir).await?;
        let Some((&epoch, &is_tombstone)) = epochs.range(..=instant.epoch_seconds()).next_back() else {
            return Ok(None);
        };
        let snapshot_instant = Instant::from_epoch_seconds(epoch);
        if is_tombstone {
            return Ok(Some(Snapshot { instant: snapshot_instant, kind: SnapshotKind::Tombstone }));
        }
        let content = tokio::fs::read_to_string(Self::data_path(&dir, epoch)).await?;
        Ok(Some(Snapshot { instant: snapshot_instant, kind: SnapshotKind::Data(parse_nquads(&content)) }))
    }

    async fn list(&self, id: &str, now: Instant) -> StorageResult<Vec<MementoRange>> {
        let _guard = self.locks.read().await;
        let dir = self.dir_for(id);
        let epochs = Self::list_epochs(&dir).await?;
        let instants: Vec<i64> = epochs.keys().copied().collect();
        let mut ranges = Vec::with_capacity(instants.len());
        for (i, &epoch) in instants.iter().enumerate() {
            let end = instants.get(i + 1).copied().unwrap_or(now.epoch_seconds().max(epoch));
            ranges.push(MementoRange {
                start: Instant::from_epoch_seconds(epoch),
                end: Instant::from_epoch_seconds(end),
            });
        }
        Ok(ranges)
    }

    async fn delete(&self, id: &str, instant: Instant) -> StorageResult<()> {
        let _guard = self.locks.write().await;
        let dir = self.dir_for(id);
        let _ = tokio::fs::remove_file(Self::data_path(&dir, instant.epoch_seconds())).await;
        let _ = tokio::fs::remove_file(Self::tombstone_path(&dir, instant.epoch_seconds())).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_the_greatest_snapshot_not_after_instant() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMementoStore::new(dir.path(), LayoutConfig::default());
        store.put("r1", Instant::from_epoch_seconds(100), vec![]).await.unwrap();
        store.put("r1", Instant::from_epoch_seconds(200), vec![]).await.unwrap();

        assert!(store.get("r1", Instant::from_epoch_seconds(50)).await.unwrap().is_none());
        let at150 = store.get("r1", Instant::from_epoch_seconds(150)).await.unwrap().unwrap();
        assert_eq!(at150.instant.epoch_seconds(), 100);
        let at200 = store.get("r1", Instant::from_epoch_seconds(200)).await.unwrap().unwrap();
        assert_eq!(at200.instant.epoch_seconds(), 200);
    }

    #[tokio::test]
    async fn list_produces_half_open_ranges_ending_at_now() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMementoStore::new(dir.path(), LayoutConfig::default());
        store.put("r1", Instant::from_epoch_seconds(100), vec![]).await.unwrap();
        store.put("r1", Instant::from_epoch_seconds(200), vec![]).await.unwrap();

        let ranges = store.list("r1", Instant::from_epoch_seconds(300)).await.unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], MementoRange { start: Instant::from_epoch_seconds(100), end: Instant::from_epoch_seconds(200) });
        assert_eq!(ranges[1], MementoRange { start: Instant::from_epoch_seconds(200), end: Instant::from_epoch_seconds(300) });
    }

    #[tokio::test]
    async fn tombstone_is_distinguishable_from_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMementoStore::new(dir.path(), LayoutConfig::default());
        store.put("r1", Instant::from_epoch_seconds(100), vec![]).await.unwrap();
        store.put_tombstone("r1", Instant::from_epoch_seconds(200)).await.unwrap();

        let snapshot = store.get("r1", Instant::from_epoch_seconds(250)).await.unwrap().unwrap();
        assert!(matches!(snapshot.kind, SnapshotKind::Tombstone));
    }

    #[tokio::test]
    async fn same_epoch_second_collapses_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMementoStore::new(dir.path(), LayoutConfig::default());
        let instant = Instant::from_epoch_seconds(100);
        let first = Quad::new(
            trellis_rdf::Iri::new("g"),
            trellis_rdf::Iri::new("s"),
            trellis_rdf::Iri::new("p"),
            trellis_rdf::Term::Literal(trellis_rdf::Literal::plain("first")),
        );
        let second = Quad::new(
            trellis_rdf::Iri::new("g"),
            trellis_rdf::Iri::new("s"),
            trellis_rdf::Iri::new("p"),
            trellis_rdf::Term::Literal(trellis_rdf::Literal::plain("second")),
        );
        store.put("r1", instant, vec![first]).await.unwrap();
        store.put("r1", instant, vec![second.clone()]).await.unwrap();

        let snapshot = store.get("r1", instant).await.unwrap().unwrap();
        match snapshot.kind {
            SnapshotKind::Data(quads) => assert_eq!(quads, vec![second]),
            SnapshotKind::Tombstone => panic!("expected data"),
        }
    }
}
