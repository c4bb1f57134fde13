//! C2: identifier translation between the internal (`trellis:data/…`) and external
//! (deployment base URL) address spaces. A pure prefix swap; anything that doesn't
//! start with the expected prefix passes through unchanged (spec.md §4.1).

use crate::term::Iri;

pub const INTERNAL_PREFIX: &str = "trellis:data/";
pub const BNODE_PREFIX: &str = "trellis:bnode/";

/// Rewrites an internal `trellis:data/…` identifier to an external URL rooted at
/// `base_url`. Returns the identifier unchanged if it does not carry the internal
/// prefix.
pub fn to_external(internal: &Iri, base_url: &str) -> Iri {
    match internal.as_str().strip_prefix(INTERNAL_PREFIX) {
        Some(suffix) => Iri::new(format!("{}{}", ensure_trailing_slash(base_url), suffix)),
        None => internal.clone(),
    }
}

/// Rewrites an external URL rooted at `base_url` back to its internal
/// `trellis:data/…` form. Returns the identifier unchanged if it does not start
/// with `base_url`.
pub fn to_internal(external: &Iri, base_url: &str) -> Iri {
    let base = ensure_trailing_slash(base_url);
    match external.as_str().strip_prefix(base.as_str()) {
        Some(suffix) => Iri::new(format!("{INTERNAL_PREFIX}{suffix}")),
        None => external.clone(),
    }
}

fn ensure_trailing_slash(base_url: &str) -> String {
    if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swaps_prefix_both_ways() {
        let base = "http://example.org/";
        let internal = Iri::new("trellis:data/foo/bar");
        let external = to_external(&internal, base);
        assert_eq!(external.as_str(), "http://example.org/foo/bar");
        assert_eq!(to_internal(&external, base), internal);
    }

    #[test]
    fn passes_through_unrelated_iris_unchanged() {
        let other = Iri::new("http://purl.org/dc/terms/title");
        assert_eq!(to_external(&other, "http://example.org/"), other);
        assert_eq!(to_internal(&other, "http://example.org/"), other);
    }
}
