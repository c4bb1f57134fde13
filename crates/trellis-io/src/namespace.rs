//! C7: the namespace service — a process-wide prefix-to-namespace map, persisted
//! as a single JSON file rewritten atomically on every mutation (spec.md §6
//! "Namespaces: a JSON file `{prefix: namespace}`").

use crate::error::{IoError, IoResult};
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::PathBuf;

pub struct NamespaceService {
    path: PathBuf,
    prefixes: DashMap<String, String>,
}

impl NamespaceService {
    /// Loads the prefix map from `path` if it exists, otherwise starts empty.
    /// The map is created lazily on the first `set_prefix` call.
    pub async fn load(path: impl Into<PathBuf>) -> IoResult<Self> {
        let path = path.into();
        let prefixes = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let parsed: HashMap<String, String> = serde_json::from_str(&contents)
                    .map_err(|err| IoError::BadRdfSyntax { syntax: "namespace json", reason: err.to_string() })?;
                DashMap::from_iter(parsed)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => DashMap::new(),
            Err(err) => return Err(IoError::Storage(err)),
        };
        Ok(Self { path, prefixes })
    }

    pub fn get(&self, prefix: &str) -> Option<String> {
        self.prefixes.get(prefix).map(|entry| entry.clone())
    }

    pub fn find_prefix(&self, namespace: &str) -> Option<String> {
        self.prefixes.iter().find(|entry| entry.value() == namespace).map(|entry| entry.key().clone())
    }

    pub fn all(&self) -> HashMap<String, String> {
        self.prefixes.iter().map(|entry| (entry.key().clone(), entry.value().clone())).collect()
    }

    /// Binds `prefix` to `namespace`. Rebinding a prefix to a different namespace
    /// than it already holds is a conflict; rebinding to the same namespace is a
    /// no-op that still persists (idempotent).
    pub async fn set_prefix(&self, prefix: &str, namespace: &str) -> IoResult<()> {
        if let Some(existing) = self.prefixes.get(prefix) {
            if existing.value() != namespace {
                return Err(IoError::PrefixConflict(prefix.to_string()));
            }
        }
        self.prefixes.insert(prefix.to_string(), namespace.to_string());
        self.persist().await
    }

    async fn persist(&self) -> IoResult<()> {
        let snapshot = self.all();
        let serialized = serde_json::to_string_pretty(&snapshot)
            .map_err(|err| IoError::BadRdfSyntax { syntax: "namespace json", reason: err.to_string() })?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, serialized).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let service = NamespaceService::load(dir.path().join("namespaces.json")).await.unwrap();
        service.set_prefix("dc", "http://purl.org/dc/terms/").await.unwrap();
        assert_eq!(service.get("dc"), Some("http://purl.org/dc/terms/".to_string()));
    }

    #[tokio::test]
    async fn persists_across_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("namespaces.json");
        {
            let service = NamespaceService::load(&path).await.unwrap();
            service.set_prefix("ldp", "http://www.w3.org/ns/ldp#").await.unwrap();
        }
        let reloaded = NamespaceService::load(&path).await.unwrap();
        assert_eq!(reloaded.get("ldp"), Some("http://www.w3.org/ns/ldp#".to_string()));
    }

    #[tokio::test]
    async fn rebinding_a_prefix_to_a_different_namespace_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let service = NamespaceService::load(dir.path().join("namespaces.json")).await.unwrap();
        service.set_prefix("dc", "http://purl.org/dc/terms/").await.unwrap();
        let result = service.set_prefix("dc", "http://purl.org/dc/elements/1.1/").await;
        assert!(matches!(result, Err(IoError::PrefixConflict(_))));
    }

    #[tokio::test]
    async fn rebinding_to_the_same_namespace_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let service = NamespaceService::load(dir.path().join("namespaces.json")).await.unwrap();
        service.set_prefix("dc", "http://purl.org/dc/terms/").await.unwrap();
        service.set_prefix("dc", "http://purl.org/dc/terms/").await.unwrap();
    }
}
