//! Tracing setup for the assembled app. Every sibling engine crate
//! (dex/oracle/compute/breaker) is a pure deterministic library with no
//! process of its own to log from; this is the one layer that actually
//! runs as a long-lived process, so it owns the subscriber.

use tracing_subscriber::EnvFilter;

/// Installs a global subscriber reading `RUST_LOG` (default `info`),
/// writing structured fields to stdout. Call once at process startup;
/// a second call is a no-op rather than a panic, since tests may end up
/// constructing more than one `App` in the same binary.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
