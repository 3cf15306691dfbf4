//! Startup error types for Wiretap.
//!
//! [`WiretapError`] covers the process-fatal failures that can occur before
//! the server begins accepting traffic. Request-scoped failures never reach
//! this enum: they are outcomes of individual pipeline stages and live with
//! their components ([`throttle::Cancelled`](crate::throttle::Cancelled),
//! [`capture::decode::DecodeRejected`](crate::capture::decode::DecodeRejected)).

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WiretapError {
    #[error("Invalid request rate: {value} (RPS must be a positive number)")]
    InvalidRate { value: f64 },

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
