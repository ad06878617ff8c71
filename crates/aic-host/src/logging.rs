//! Logging configuration for the host binary
//!
//! Default level INFO, overrideable via `RUST_LOG`.

use tracing::Level;

/// Initialise the tracing subscriber with the host's standard format
///
/// # Environment
/// ```bash
/// RUST_LOG=debug aic-host start
/// RUST_LOG=aic_host=trace aic-host status
/// ```
pub fn init_logging() {
    init_logging_with_level(Level::INFO)
}

/// Initialise the tracing subscriber with a custom default level
pub fn init_logging_with_level(default_level: Level) {
    use tracing_subscriber::fmt::time::SystemTime;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_timer(SystemTime)
        .with_target(true)
        .with_level(true)
        .init();
}
