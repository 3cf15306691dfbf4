//! Content decoding driven by the `Content-Encoding` request header.
//!
//! Only `zstd` is recognized; every other token (and no token at all) is an
//! identity pass-through, so a caller can never make the endpoint choke by
//! declaring an encoding we do not speak.
//!
//! Failure handling is split by where the failure lands: a stream that
//! cannot even begin decompressing rejects the request, while a stream that
//! breaks after producing output degrades to a diagnostic placeholder and
//! the request completes normally.

use std::io::{Cursor, Read};

use http::header::CONTENT_ENCODING;
use http::HeaderMap;

const DECODE_BUF: usize = 16 * 1024;

/// Decompression could not start on the declared encoding. The request is
/// rejected with HTTP 400 carrying this message as the body.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct DecodeRejected {
    message: String,
}

/// Transform selected from the request's `Content-Encoding` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoding {
    Identity,
    Zstd,
}

impl Decoding {
    /// Only the exact token `zstd` selects decompression.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match headers.get(CONTENT_ENCODING).and_then(|v| v.to_str().ok()) {
            Some("zstd") => Self::Zstd,
            _ => Self::Identity,
        }
    }
}

/// Result of running the decoder over a complete raw body.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Fully decoded payload bytes.
    Body(Vec<u8>),
    /// Decoding began but failed mid-stream; whatever was decoded is
    /// discarded and the payload becomes this diagnostic placeholder.
    Degraded(String),
}

pub fn decode(decoding: Decoding, raw: &[u8]) -> Result<DecodeOutcome, DecodeRejected> {
    match decoding {
        Decoding::Identity => Ok(DecodeOutcome::Body(raw.to_vec())),
        Decoding::Zstd => decode_zstd(raw),
    }
}

fn decode_zstd(raw: &[u8]) -> Result<DecodeOutcome, DecodeRejected> {
    let mut decoder = zstd::stream::read::Decoder::new(Cursor::new(raw)).map_err(|e| {
        DecodeRejected {
            message: e.to_string(),
        }
    })?;

    let mut out = Vec::new();
    let mut buf = [0u8; DECODE_BUF];
    loop {
        match decoder.read(&mut buf) {
            Ok(0) => return Ok(DecodeOutcome::Body(out)),
            Ok(n) => out.extend_from_slice(&buf[..n]),
            // Zero bytes produced: the stream cannot even begin.
            Err(e) if out.is_empty() => {
                return Err(DecodeRejected {
                    message: e.to_string(),
                })
            }
            Err(e) => return Ok(DecodeOutcome::Degraded(read_failure(&e)))
        }
    }
}

/// Diagnostic placeholder substituted for the payload when a body read
/// fails after capture has begun.
#[must_use]
pub fn read_failure(error: &impl std::fmt::Display) -> String {
    format!("(failed to read body: {error})")
}
