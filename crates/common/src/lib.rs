//! Shared utilities: logging bootstrap and retry backoff.

mod backoff;

pub use backoff::ExponentialBackoff;

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Honors `RUST_LOG` when set, defaults to `info` otherwise. Call once,
/// first thing in `main`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
