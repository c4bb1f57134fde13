//! Memento (RFC 7089) HTTP surface: `Link: rel="timegate"/"timemap"/"memento"`
//! headers and the `?ext=timemap` document (spec.md §4.4, §6).

use chrono::{DateTime, Utc};
use trellis_rdf::Instant;
use trellis_storage::MementoRange;

fn http_date(instant: Instant) -> String {
    DateTime::<Utc>::from_timestamp(instant.epoch_seconds(), 0)
        .unwrap_or_else(Utc::now)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// The three `Link` header values every representation of a Memento-tracked
/// resource carries, pointing at itself as the original/timegate and at its
/// timemap (spec.md §4.4 "TimeMap/TimeGate").
pub fn link_headers(external_uri: &str) -> Vec<String> {
    vec![
        format!("<{external_uri}>; rel=\"original timegate\""),
        format!("<{external_uri}?ext=timemap>; rel=\"timemap\"; type=\"application/link-format\""),
    ]
}

/// One `Link: rel="memento"` entry per snapshot, plus the first/last markers
/// TimeMap consumers expect.
pub fn memento_links(external_uri: &str, ranges: &[MementoRange]) -> Vec<String> {
    ranges
        .iter()
        .enumerate()
        .map(|(index, range)| {
            let mut rel = "memento".to_string();
            if index == 0 {
                rel.push_str(" first");
            }
            if index == ranges.len() - 1 {
                rel.push_str(" last");
            }
            format!(
                "<{external_uri}?version={}>; rel=\"{rel}\"; datetime=\"{}\"",
                range.start.epoch_seconds(),
                http_date(range.start)
            )
        })
        .collect()
}

/// Renders an `application/link-format` TimeMap body (RFC 7089 §5).
pub fn render_timemap(external_uri: &str, ranges: &[MementoRange]) -> String {
    let mut entries = vec![
        format!("<{external_uri}>; rel=\"original\""),
        format!("<{external_uri}?ext=timemap>; rel=\"self\"; type=\"application/link-format\""),
    ];
    entries.extend(memento_links(external_uri, ranges));
    entries.join(",\n")
}

/// Resolves an `Accept-Datetime` header (RFC 7089 §2.1.1, HTTP-date format) to
/// the instant whose snapshot should be served. Falls back to `now` on a
/// malformed header, since TimeGate negotiation degrades to "current version".
pub fn parse_accept_datetime(header: Option<&str>) -> Instant {
    let Some(header) = header else { return Instant::now() };
    match DateTime::parse_from_rfc2822(header) {
        Ok(parsed) => Instant::from_epoch_seconds(parsed.timestamp()),
        Err(_) => Instant::now(),
    }
}
