//! Wiretap is a diagnostic HTTP endpoint.
//!
//! It accepts any request on any path, optionally decompresses the body,
//! throttles overall throughput to a configured rate, and writes a full
//! snapshot of the request (timestamp, method, URL, headers, body) to two
//! destinations at once: the HTTP response and the process log stream. Point
//! a webhook sender, a retrying client, or a compressing upstream at it and
//! watch what actually arrives.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`capture`] -- The catch-all handler and its pipeline: content decoding,
//!   snapshot assembly, rendering, and dual-sink output.
//! - [`error`] -- Startup error types using `thiserror`.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`run`] -- Server startup, listener binding, and graceful shutdown.
//! - [`server`] -- Shared application state and the Axum router.
//! - [`throttle`] -- The process-wide token-bucket rate limiter every request
//!   waits on before being captured.

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod capture;
pub mod cli;
pub mod error;
pub mod logging;
pub mod run;
pub mod server;
pub mod throttle;
