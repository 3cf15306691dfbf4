//! Server startup: validate configuration, bind, serve, shut down.
//!
//! Wires the resolved CLI arguments into [`AppState`], binds the listener,
//! and runs the Axum server with graceful shutdown. The shutdown signal is
//! fanned into the throttle's cancellation channel so requests parked at
//! the rate limiter are abandoned instead of holding the process open.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use crate::capture::render::RenderMode;
use crate::cli::Cli;
use crate::error::WiretapError;
use crate::logging;
use crate::server::{self, AppState};
use crate::throttle::RateLimiter;

pub async fn execute(args: Cli) -> Result<(), WiretapError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    if !args.rps.is_finite() || args.rps <= 0.0 {
        return Err(WiretapError::InvalidRate { value: args.rps });
    }

    let render_mode = if args.structured {
        RenderMode::Json
    } else {
        RenderMode::Text
    };

    // Dropping or firing this sender cancels every wait parked in the
    // throttle; it fires from the graceful-shutdown future below.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let state = Arc::new(AppState {
        limiter: RateLimiter::new(args.rps),
        render_mode,
        log_sink: Mutex::new(Box::new(std::io::stderr())),
        shutdown: shutdown_rx,
    });

    let router = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        rps = args.rps,
        mode = ?render_mode,
        git = env!("WIRETAP_GIT_SHORT"),
        profile = env!("WIRETAP_BUILD_PROFILE"),
        "wiretap started"
    );

    let graceful_shutdown = async move {
        server::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(graceful_shutdown)
        .await?;

    tracing::info!("wiretap stopped");
    Ok(())
}
