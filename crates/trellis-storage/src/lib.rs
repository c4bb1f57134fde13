//! Binary, resource, audit, and Memento store drivers (spec.md components C3-C6).

pub mod audit;
pub mod binary;
pub mod error;
pub mod memento;
pub mod repository;
pub mod resource_store;

pub use audit::{AuditStore, FileAuditStore, NullAuditStore};
pub use binary::{digest_bytes, BinaryStore, DigestAlgorithm, FileBinaryStore};
pub use error::{StorageError, StorageResult};
pub use memento::{FileMementoStore, MementoRange, MementoStore, Snapshot, SnapshotKind};
pub use repository::Repository;
pub use resource_store::{FileResourceStore, ResourceMeta, ResourceStore};
