use thiserror::Error;

/// The storage-layer error kinds relevant to spec.md §7's table: `NotFound` and
/// `Conflict` are recognized kinds the HTTP layer maps to specific statuses;
/// anything else escalates to `Internal`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage conflict: {0}")]
    Conflict(String),

    #[error("storage I/O error")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;
