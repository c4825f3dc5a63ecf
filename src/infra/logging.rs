//! Process-wide `tracing` subscriber.

use tracing_subscriber::{prelude::*, EnvFilter};

/// Installs a fmt subscriber filtered by `RUST_LOG` (or the crate default).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_new(super::config::log_filter())
        .unwrap_or_else(|_| EnvFilter::new(super::config::DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}
