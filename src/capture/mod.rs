//! Catch-all request capture.
//!
//! [`capture_handler`] is the Axum fallback that receives every request —
//! any method, any path — and runs it through the pipeline: throttle wait,
//! content decoding ([`decode`]), snapshot assembly ([`snapshot`]),
//! rendering ([`render`]), and dual-sink output ([`sink`]). There is no
//! routing and there are no reserved paths.

pub mod decode;
pub mod render;
pub mod sink;
pub mod snapshot;

use std::io::Write;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use http_body_util::BodyExt;

use crate::server::AppState;

use self::decode::{DecodeOutcome, Decoding};
use self::snapshot::RequestSnapshot;

pub async fn capture_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let correlation_id = headers
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    // Client disconnect cancels by dropping this future; the watch channel
    // covers process shutdown. Either way the request is abandoned before
    // anything is captured.
    let mut cancel = state.shutdown.clone();
    if state.limiter.wait(&mut cancel).await.is_err() {
        tracing::debug!(
            correlation_id = %correlation_id,
            method = %method,
            url = %uri,
            "shutting down, abandoning throttled request"
        );
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let decoding = Decoding::from_headers(&headers);
    let declared_length = declared_length(&headers);

    let body = match body.collect().await {
        Ok(collected) => match decode::decode(decoding, &collected.to_bytes()) {
            Ok(DecodeOutcome::Body(decoded)) => decoded,
            Ok(DecodeOutcome::Degraded(placeholder)) => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    "body decode failed mid-stream, capturing placeholder"
                );
                placeholder.into_bytes()
            }
            Err(rejected) => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    error = %rejected,
                    "undecodable body, rejecting"
                );
                return (StatusCode::BAD_REQUEST, rejected.to_string()).into_response();
            }
        },
        Err(e) => {
            tracing::warn!(
                correlation_id = %correlation_id,
                error = %e,
                "body read failed, capturing placeholder"
            );
            decode::read_failure(&e).into_bytes()
        }
    };

    let snapshot = RequestSnapshot::capture(&method, &uri, &headers, declared_length, body);
    let rendered = render::render(&snapshot, state.render_mode);

    let mut response_body: Vec<u8> = Vec::with_capacity(rendered.len() + 1);
    {
        let mut log = state.log_sink.lock().expect("log sink poisoned");
        sink::emit(
            &rendered,
            &mut [
                ("response", &mut response_body as &mut dyn Write),
                ("log", log.as_mut()),
            ],
        );
    }

    tracing::info!(
        correlation_id = %correlation_id,
        method = %method,
        url = %uri,
        bytes = rendered.len(),
        "request captured"
    );

    (StatusCode::OK, response_body).into_response()
}

fn declared_length(headers: &HeaderMap) -> i64 {
    headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(-1)
}
