//! Content negotiation: `Accept` -> `RdfSyntax` with q-value ranking, and the
//! JSON-LD `profile=` media-type parameter -> `JsonLdProfile` (spec.md §4.5).

use trellis_io::{supported_read_syntaxes, JsonLdProfile, RdfSyntax};

struct Candidate {
    media_type: String,
    quality: f32,
}

/// Parses an `Accept` header into media types ordered by descending q-value
/// (ties broken by header order), then picks the first one this server can
/// serialize. A missing or `*/*`-only header defaults to Turtle.
pub fn negotiate_syntax(accept: Option<&str>) -> Option<RdfSyntax> {
    let Some(accept) = accept else { return Some(RdfSyntax::Turtle) };
    let mut candidates = parse_accept(accept);
    candidates.sort_by(|a, b| b.quality.partial_cmp(&a.quality).unwrap_or(std::cmp::Ordering::Equal));

    let supported = supported_read_syntaxes();
    for candidate in &candidates {
        if candidate.media_type == "*/*" {
            return Some(RdfSyntax::Turtle);
        }
        if let Some(syntax) = RdfSyntax::from_media_type(&candidate.media_type) {
            if supported.contains(&syntax) {
                return Some(syntax);
            }
        }
    }
    None
}

fn parse_accept(accept: &str) -> Vec<Candidate> {
    accept
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            let mut segments = part.split(';');
            let media_type = segments.next()?.trim().to_string();
            let quality = segments
                .filter_map(|param| {
                    let param = param.trim();
                    param.strip_prefix("q=").and_then(|value| value.parse::<f32>().ok())
                })
                .next()
                .unwrap_or(1.0);
            Some(Candidate { media_type, quality })
        })
        .collect()
}

/// Extracts `profile="..."` from an `application/ld+json` `Accept` entry, if
/// present; defaults to `Compacted` (spec.md §4.5 JSON-LD profiles).
pub fn negotiate_jsonld_profile(accept: Option<&str>) -> JsonLdProfile {
    let Some(accept) = accept else { return JsonLdProfile::select("") };
    for part in accept.split(',') {
        if let Some(start) = part.find("profile=") {
            let rest = &part[start + "profile=".len()..];
            let value = rest.trim().trim_matches('"');
            return JsonLdProfile::select(value);
        }
    }
    JsonLdProfile::select("")
}
