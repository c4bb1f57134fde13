//! POST child-identifier selection: honors the `Slug` header when the name is
//! free, otherwise falls back to a generated identifier (spec.md §4.1 "POST").

use uuid::Uuid;

const RESERVED: [char; 9] = ['/', '?', '#', '\\', ' ', '<', '>', '"', '%'];

/// Sanitizes a client-supplied `Slug` header into a single path segment, or
/// `None` if nothing usable survives.
pub fn sanitize_slug(slug: Option<&str>) -> Option<String> {
    let slug = slug?.trim();
    if slug.is_empty() {
        return None;
    }
    let cleaned: String = slug.chars().filter(|c| !RESERVED.contains(c)).collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

pub fn generate_slug() -> String {
    Uuid::new_v4().simple().to_string()
}
