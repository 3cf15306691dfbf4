//! Shared application state, router assembly, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding the throttle,
//! render mode, log sink, and shutdown signal), [`build_router`] for the
//! catch-all Axum router, and [`shutdown_signal`] for SIGTERM / Ctrl+C
//! handling.

use std::io::Write;
use std::sync::{Arc, Mutex};

use axum::Router;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::capture;
use crate::capture::render::RenderMode;
use crate::throttle::RateLimiter;

/// State shared by every request-handling task.
///
/// The rate limiter is the only cross-request serialization point in the
/// process; the log sink mutex merely serializes the final snapshot write.
pub struct AppState {
    pub limiter: RateLimiter,
    pub render_mode: RenderMode,
    /// Process-wide destination for the log half of the dual-sink output.
    /// Stderr in production, an inspectable buffer in tests.
    pub log_sink: Mutex<Box<dyn Write + Send>>,
    /// Observed by the throttle so waiters abandon on shutdown.
    pub shutdown: watch::Receiver<bool>,
}

/// Build the catch-all router: no routes, only the capture fallback, so
/// every method on every path is accepted. `TraceLayer` provides the
/// operational access log; snapshot output goes through the dual sink
/// instead.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(capture::capture_handler)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
