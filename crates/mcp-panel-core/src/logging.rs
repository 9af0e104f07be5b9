//! Developer log: `.env` loading and the `tracing` subscriber.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Loads `.env` (if present) and installs the fmt subscriber filtered by `RUST_LOG`
/// (default `info`). Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[mcp-control-panel] .env not loaded: {} (using system environment)", e);
    }

    // already installed (tests, embedding apps) is fine
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
