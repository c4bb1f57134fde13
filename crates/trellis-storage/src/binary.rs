//! C3: the binary store driver — opaque byte storage, ranged reads, digest
//! computation (spec.md §4.2).

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use futures::Stream;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest as Sha2Digest, Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_384, Sha3_512};
use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use trellis_rdf::layout::{generate_binary_id, BinaryIdLayout};

pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Digest algorithms the binary store knows how to compute (spec.md §4.2).
/// `SHA` is recognized as a legacy alias for `Sha1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

impl DigestAlgorithm {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "MD5" => Some(Self::Md5),
            "SHA" | "SHA-1" | "SHA1" => Some(Self::Sha1),
            "SHA-256" | "SHA256" => Some(Self::Sha256),
            "SHA-384" | "SHA384" => Some(Self::Sha384),
            "SHA-512" | "SHA512" => Some(Self::Sha512),
            "SHA3-256" => Some(Self::Sha3_256),
            "SHA3-384" => Some(Self::Sha3_384),
            "SHA3-512" => Some(Self::Sha3_512),
            _ => None,
        }
    }

    pub fn header_name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha",
            Self::Sha256 => "sha-256",
            Self::Sha384 => "sha-384",
            Self::Sha512 => "sha-512",
            Self::Sha3_256 => "sha3-256",
            Self::Sha3_384 => "sha3-384",
            Self::Sha3_512 => "sha3-512",
        }
    }
}

/// Computes the base64-encoded digest of a complete byte slice. The binary store
/// always reads the whole stored object for this — never an HTTP payload subset
/// (spec.md §4.2 invariant).
pub fn digest_bytes(algorithm: DigestAlgorithm, content: &[u8]) -> String {
    match algorithm {
        DigestAlgorithm::Md5 => {
            let mut hasher = Md5::new();
            hasher.update(content);
            BASE64.encode(hasher.finalize())
        }
        DigestAlgorithm::Sha1 => {
            let mut hasher = Sha1::new();
            hasher.update(content);
            BASE64.encode(hasher.finalize())
        }
        DigestAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(content);
            BASE64.encode(hasher.finalize())
        }
        DigestAlgorithm::Sha384 => {
            let mut hasher = Sha384::new();
            hasher.update(content);
            BASE64.encode(hasher.finalize())
        }
        DigestAlgorithm::Sha512 => {
            let mut hasher = Sha512::new();
            hasher.update(content);
            BASE64.encode(hasher.finalize())
        }
        DigestAlgorithm::Sha3_256 => {
            let mut hasher = Sha3_256::new();
            hasher.update(content);
            BASE64.encode(hasher.finalize())
        }
        DigestAlgorithm::Sha3_384 => {
            let mut hasher = Sha3_384::new();
            hasher.update(content);
            BASE64.encode(hasher.finalize())
        }
        DigestAlgorithm::Sha3_512 => {
            let mut hasher = Sha3_512::new();
            hasher.update(content);
            BASE64.encode(hasher.finalize())
        }
    }
}

#[async_trait]
pub trait BinaryStore: Send + Sync {
    /// Mints a fresh identifier under this store's sharding hierarchy; does not
    /// write anything.
    fn generate_id(&self) -> String;

    async fn get(&self, id: &str) -> StorageResult<ByteStream>;

    /// Ranged read. `from >= 0`, `to > from`. Fails with `NotFound` if absent.
    async fn get_range(&self, id: &str, from: u64, to: u64) -> StorageResult<ByteStream>;

    async fn put(&self, id: &str, content: &[u8], metadata: HashMap<String, String>) -> StorageResult<()>;

    /// Best-effort delete; a missing object is not an error (logged at warn).
    async fn purge(&self, id: &str);

    /// Streams the complete stored object through `algorithm`. Returns `Ok(None)`
    /// for an unsupported algorithm name, not an error.
    async fn digest(&self, id: &str, algorithm: Option<DigestAlgorithm>) -> StorageResult<Option<String>>;
}

pub struct FileBinaryStore {
    base_path: PathBuf,
    layout: BinaryIdLayout,
}

impl FileBinaryStore {
    pub fn new(base_path: impl Into<PathBuf>, layout: BinaryIdLayout) -> Self {
        Self { base_path: base_path.into(), layout }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.base_path.join(id)
    }

    fn meta_path_for(&self, id: &str) -> PathBuf {
        let mut path = self.path_for(id).into_os_string();
        path.push(".meta");
        PathBuf::from(path)
    }
}

#[async_trait]
impl BinaryStore for FileBinaryStore {
    fn generate_id(&self) -> String {
        generate_binary_id(self.layout)
    }

    async fn get(&self, id: &str) -> StorageResult<ByteStream> {
        let path = self.path_for(id);
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|_| StorageError::NotFound(id.to_string()))?;
        Ok(Box::pin(tokio_util::io::ReaderStream::new(file)))
    }

    async fn get_range(&self, id: &str, from: u64, to: u64) -> StorageResult<ByteStream> {
        let path = self.path_for(id);
        let mut file = tokio::fs::File::open(&path)
            .await
            .map_err(|_| StorageError::NotFound(id.to_string()))?;
        file.seek(SeekFrom::Start(from)).await?;
        let limited = file.take(to.saturating_sub(from));
        Ok(Box::pin(tokio_util::io::ReaderStream::new(limited)))
    }

    async fn put(&self, id: &str, content: &[u8], metadata: HashMap<String, String>) -> StorageResult<()> {
        let path = self.path_for(id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = path.with_extension("tmp");
        {
            let mut tmp = tokio::fs::File::create(&tmp_path).await?;
            tmp.write_all(content).await?;
            tmp.flush().await?;
        }
        tokio::fs::rename(&tmp_path, &path).await?;

        if !metadata.is_empty() {
            let meta_path = self.meta_path_for(id);
            let serialized = metadata
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("\n");
            tokio::fs::write(meta_path, serialized).await?;
        }
        Ok(())
    }

    async fn purge(&self, id: &str) {
        let path = self.path_for(id);
        if let Err(err) = tokio::fs::remove_file(&path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(%id, %err, "failed to purge binary");
            }
        }
        let _ = tokio::fs::remove_file(self.meta_path_for(id)).await;
    }

    async fn digest(&self, id: &str, algorithm: Option<DigestAlgorithm>) -> StorageResult<Option<String>> {
        let Some(algorithm) = algorithm else { return Ok(None) };
        let path = self.path_for(id);
        let content = tokio::fs::read(&path)
            .await
            .map_err(|_| StorageError::NotFound(id.to_string()))?;
        Ok(Some(digest_bytes(algorithm, &content)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBinaryStore::new(dir.path(), BinaryIdLayout::default());
        let id = store.generate_id();
        store.put(&id, b"hello world", HashMap::new()).await.unwrap();

        let mut stream = store.get(&id).await.unwrap();
        let mut collected = Vec::new();
        use futures::StreamExt;
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, b"hello world");
    }

    #[tokio::test]
    async fn ranged_read_returns_the_requested_slice() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBinaryStore::new(dir.path(), BinaryIdLayout::default());
        let id = store.generate_id();
        store.put(&id, b"0123456789", HashMap::new()).await.unwrap();

        let mut stream = store.get_range(&id, 2, 5).await.unwrap();
        let mut collected = Vec::new();
        use futures::StreamExt;
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, b"234");
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBinaryStore::new(dir.path(), BinaryIdLayout::default());
        assert!(matches!(store.get("nope").await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn purge_missing_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBinaryStore::new(dir.path(), BinaryIdLayout::default());
        store.purge("nope").await;
    }

    #[tokio::test]
    async fn digest_reads_the_whole_object_for_every_supported_algorithm() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBinaryStore::new(dir.path(), BinaryIdLayout::default());
        let id = store.generate_id();
        store.put(&id, b"the quick brown fox", HashMap::new()).await.unwrap();

        for algorithm in [
            DigestAlgorithm::Md5,
            DigestAlgorithm::Sha1,
            DigestAlgorithm::Sha256,
            DigestAlgorithm::Sha384,
            DigestAlgorithm::Sha512,
            DigestAlgorithm::Sha3_256,
            DigestAlgorithm::Sha3_384,
            DigestAlgorithm::Sha3_512,
        ] {
            let computed = store.digest(&id, Some(algorithm)).await.unwrap();
            assert_eq!(computed, Some(digest_bytes(algorithm, b"the quick brown fox")));
        }
    }

    #[tokio::test]
    async fn unsupported_algorithm_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBinaryStore::new(dir.path(), BinaryIdLayout::default());
        let id = store.generate_id();
        store.put(&id, b"data", HashMap::new()).await.unwrap();
        assert_eq!(store.digest(&id, None).await.unwrap(), None);
    }
}
