//! C2: maps an identifier to a filesystem path (spec.md §4.1, §6 "Persisted state
//! layout"). The resource directory is `CRC32(iri)` split into `MAX` directory
//! segments of `LENGTH` hex chars, with a leaf directory named `MD5(iri)`. Binary
//! identifiers use a separate random-id hierarchy to bound directory fan-out.

use md5::{Digest, Md5};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Clone, Copy, Debug)]
pub struct LayoutConfig {
    pub length: usize,
    pub max: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { length: 2, max: 3 }
    }
}

/// Computes the resource directory path for `iri`, relative to a store's base path.
/// Pure function of the IRI and `config` (invariant I6).
pub fn resource_path(iri: &str, config: LayoutConfig) -> PathBuf {
    let crc = crc32fast::hash(iri.as_bytes());
    let hex = format!("{crc:08x}");
    let mut path = PathBuf::new();
    let mut offset = 0;
    for _ in 0..config.max {
        let end = (offset + config.length).min(hex.len());
        if offset >= hex.len() {
            break;
        }
        path.push(&hex[offset..end]);
        offset = end;
    }
    let mut hasher = Md5::new();
    hasher.update(iri.as_bytes());
    let digest = hasher.finalize();
    path.push(hex::encode(digest));
    path
}

/// Hierarchy-sharded binary identifier generator: a random UUID whose hex digits
/// are split into `depth` two-character directory segments before the leaf file
/// name, bounding directory size the same way `resource_path` does for resources.
#[derive(Clone, Copy, Debug)]
pub struct BinaryIdLayout {
    pub depth: usize,
}

impl Default for BinaryIdLayout {
    fn default() -> Self {
        Self { depth: 2 }
    }
}

pub fn generate_binary_id(layout: BinaryIdLayout) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    binary_id_path(&uuid, layout)
}

pub fn binary_id_path(id: &str, layout: BinaryIdLayout) -> String {
    let mut segments = Vec::new();
    let mut offset = 0;
    for _ in 0..layout.depth {
        let end = (offset + 2).min(id.len());
        if offset >= id.len() {
            break;
        }
        segments.push(&id[offset..end]);
        offset = end;
    }
    segments.push(&id[offset.min(id.len())..]);
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_is_pure_function_of_iri() {
        let iri = "trellis:data/foo";
        let config = LayoutConfig::default();
        assert_eq!(resource_path(iri, config), resource_path(iri, config));
        assert_ne!(resource_path(iri, config), resource_path("trellis:data/bar", config));
    }

    #[test]
    fn default_layout_has_three_two_char_segments_plus_md5_leaf() {
        let path = resource_path("trellis:data/foo", LayoutConfig::default());
        let components: Vec<_> = path.components().collect();
        assert_eq!(components.len(), 4);
    }
}
