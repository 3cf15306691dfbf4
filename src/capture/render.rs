//! Snapshot rendering: the textual block and the structured JSON object.
//!
//! Rendering is a pure function of the snapshot and the process-wide
//! [`RenderMode`]; the same bytes go to every output sink. The textual
//! layout is load-bearing — existing scrapers parse it — so its field order
//! and punctuation are fixed and covered by tests.

use std::borrow::Cow;

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use super::snapshot::{HeaderBlock, RequestSnapshot};

/// Matches the original tool's wall-clock line: local time with nanosecond
/// precision and a numeric zone offset.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f %z";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Text,
    Json,
}

#[must_use]
pub fn render(snapshot: &RequestSnapshot, mode: RenderMode) -> Vec<u8> {
    match mode {
        RenderMode::Text => render_text(snapshot),
        RenderMode::Json => render_json(snapshot),
    }
}

/// The deterministic textual block:
///
/// ```text
/// [<timestamp>] <method> <url>
/// <header block, pretty-printed at three-space indent>
///    (<actual>==<declared>) <body bytes>
/// ```
fn render_text(snapshot: &RequestSnapshot) -> Vec<u8> {
    let header_block = pretty_headers(&snapshot.headers);

    let mut out = Vec::with_capacity(header_block.len() + snapshot.body.len() + 64);
    out.extend_from_slice(
        format!(
            "[{}] {} {}\n",
            snapshot.timestamp.format(TIMESTAMP_FORMAT),
            snapshot.method,
            snapshot.url,
        )
        .as_bytes(),
    );
    out.extend_from_slice(header_block.as_bytes());
    out.extend_from_slice(
        format!(
            "\n   ({}=={}) ",
            snapshot.actual_length(),
            snapshot.declared_length,
        )
        .as_bytes(),
    );
    out.extend_from_slice(&snapshot.body);
    out.push(b'\n');
    out
}

/// Headers as indented JSON, every line after the first prefixed so the
/// whole block sits three spaces deep inside the textual output.
fn pretty_headers(headers: &HeaderBlock) -> String {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"   ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if let Err(e) = headers.serialize(&mut serializer) {
        tracing::warn!(error = %e, "header block serialization failed");
    }
    String::from_utf8_lossy(&buf).replace('\n', "\n   ")
}

#[derive(Serialize)]
struct StructuredSnapshot<'a> {
    now: &'a DateTime<Local>,
    method: &'a str,
    url: &'a str,
    headers: &'a HeaderBlock,
    #[serde(rename = "body-length")]
    body_length: usize,
    #[serde(rename = "content-length")]
    content_length: i64,
    body: Cow<'a, str>,
}

fn render_json(snapshot: &RequestSnapshot) -> Vec<u8> {
    let view = StructuredSnapshot {
        now: &snapshot.timestamp,
        method: &snapshot.method,
        url: &snapshot.url,
        headers: &snapshot.headers,
        body_length: snapshot.actual_length(),
        content_length: snapshot.declared_length,
        body: String::from_utf8_lossy(&snapshot.body),
    };

    let mut out = Vec::new();
    // Lenient on purpose: an incomplete snapshot still beats no snapshot,
    // and the request must not fail over its own rendering.
    if let Err(e) = serde_json::to_writer(&mut out, &view) {
        tracing::warn!(error = %e, "structured snapshot serialization failed, emitting partial output");
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use http::{HeaderMap, HeaderValue, Method, Uri};

    use super::*;

    fn snapshot(headers: HeaderMap, declared: i64, body: &[u8]) -> RequestSnapshot {
        let mut s = RequestSnapshot::capture(
            &Method::POST,
            &Uri::from_static("/hook?x=1"),
            &headers,
            declared,
            body.to_vec(),
        );
        s.timestamp = Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        s
    }

    #[test]
    fn textual_layout_is_exact() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        let s = snapshot(headers, 5, b"hello");

        let rendered = String::from_utf8(render(&s, RenderMode::Text)).unwrap();
        let expected = format!(
            "[{}] POST /hook?x=1\n\
             {{\n      \"content-type\": [\n         \"text/plain\"\n      ]\n   }}\n   \
             (5==5) hello\n",
            s.timestamp.format(TIMESTAMP_FORMAT),
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn textual_mode_keeps_raw_body_bytes() {
        let s = snapshot(HeaderMap::new(), -1, &[0x00, 0xff, 0x7f]);
        let rendered = render(&s, RenderMode::Text);
        let tail: &[u8] = b"(3==-1) \x00\xff\x7f\n";
        assert!(rendered.ends_with(tail));
    }

    #[test]
    fn structured_mode_emits_exactly_the_documented_keys() {
        let s = snapshot(HeaderMap::new(), 3, b"abc");
        let value: serde_json::Value =
            serde_json::from_slice(&render(&s, RenderMode::Json)).unwrap();
        let object = value.as_object().unwrap();

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["body", "body-length", "content-length", "headers", "method", "now", "url"]
        );
        assert_eq!(object["body-length"], 3);
        assert_eq!(object["content-length"], 3);
        assert_eq!(object["method"], "POST");
        assert_eq!(object["url"], "/hook?x=1");
        assert_eq!(object["body"], "abc");
    }

    #[test]
    fn structured_mode_serializes_binary_bodies_lossily() {
        let s = snapshot(HeaderMap::new(), -1, &[0xff, 0x61]);
        let value: serde_json::Value =
            serde_json::from_slice(&render(&s, RenderMode::Json)).unwrap();
        assert_eq!(value["body"], "\u{fffd}a");
        assert_eq!(value["body-length"], 2);
    }

    #[test]
    fn structured_headers_preserve_duplicates() {
        let mut headers = HeaderMap::new();
        headers.append("accept", HeaderValue::from_static("text/html"));
        headers.append("accept", HeaderValue::from_static("application/json"));
        let s = snapshot(headers, 0, b"");

        let value: serde_json::Value =
            serde_json::from_slice(&render(&s, RenderMode::Json)).unwrap();
        assert_eq!(
            value["headers"]["accept"],
            serde_json::json!(["text/html", "application/json"])
        );
    }
}
