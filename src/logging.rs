//! Logging setup for the health-sync binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is up
//! to the binary (or the host app).

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging with sensible defaults
///
/// This sets up tracing with:
/// - Environment-based filtering (RUST_LOG)
/// - Compact format on stderr, keeping stdout for command output
///
/// Default level is INFO, but can be overridden with RUST_LOG env var.
pub fn init() {
    init_with_level("info")
}

/// Initialize logging with a specific default level
///
/// This can still be overridden by RUST_LOG environment variable.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
