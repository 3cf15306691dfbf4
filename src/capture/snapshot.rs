//! Immutable per-request capture record.
//!
//! A [`RequestSnapshot`] is built once per request, owned exclusively by the
//! handling task, and discarded after rendering. Nothing here is shared or
//! retained across requests.

use chrono::{DateTime, Local};
use http::{HeaderMap, Method, Uri};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Everything observable about one request at the time of processing.
#[derive(Debug)]
pub struct RequestSnapshot {
    pub timestamp: DateTime<Local>,
    pub method: String,
    pub url: String,
    pub headers: HeaderBlock,
    /// Advertised body size from `Content-Length`; -1 when unknown
    /// (absent header, chunked transfer).
    pub declared_length: i64,
    /// Decoded payload bytes, or the diagnostic placeholder when the body
    /// could not be read.
    pub body: Vec<u8>,
}

impl RequestSnapshot {
    #[must_use]
    pub fn capture(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        declared_length: i64,
        body: Vec<u8>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            method: method.to_string(),
            url: uri.to_string(),
            headers: HeaderBlock::from_header_map(headers),
            declared_length,
            body,
        }
    }

    /// Length of the body as captured, post-decode. Independent of
    /// [`declared_length`](Self::declared_length): the two legitimately
    /// disagree for compressed or chunked requests.
    #[must_use]
    pub fn actual_length(&self) -> usize {
        self.body.len()
    }
}

/// Header name → ordered values, insertion order as received, duplicates
/// preserved under their first occurrence.
///
/// `http::HeaderMap` already groups repeated names; this flattens it into a
/// plain owned list so the renderer can serialize an object whose key order
/// matches the wire.
#[derive(Debug)]
pub struct HeaderBlock(Vec<(String, Vec<String>)>);

impl HeaderBlock {
    #[must_use]
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let mut entries: Vec<(String, Vec<String>)> = Vec::new();
        for (name, value) in map {
            let text = String::from_utf8_lossy(value.as_bytes()).into_owned();
            match entries.iter_mut().find(|(n, _)| n == name.as_str()) {
                Some((_, values)) => values.push(text),
                None => entries.push((name.as_str().to_string(), vec![text])),
            }
        }
        Self(entries)
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, Vec<String>)] {
        &self.0
    }
}

impl Serialize for HeaderBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, values) in &self.0 {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}
