//! Command-line interface definitions using clap derive macros.
//!
//! Wiretap is a single-purpose tool, so there are no subcommands — just the
//! flags needed to bring the endpoint up. Every flag has an environment
//! variable equivalent for container deployments.

use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(
    name = "wiretap",
    version,
    about = "Diagnostic HTTP endpoint that echoes full request snapshots",
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        wiretap                              Listen on 0.0.0.0:10000 at 3 req/s\n  \
        wiretap -p 8080 --rps 50             Faster, on port 8080\n  \
        wiretap --structured                 Emit snapshots as JSON objects\n\n  \
        Then: curl -d 'hello' localhost:10000/anything"
)]
pub struct Cli {
    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 10000)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Allowed request throughput in requests per second
    #[arg(long, env = "RPS", default_value_t = 3.0)]
    pub rps: f64,

    /// Render snapshots as a single JSON object instead of the textual block
    #[arg(long, env = "WIRETAP_STRUCTURED")]
    pub structured: bool,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}
