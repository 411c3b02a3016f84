//! Stderr tracing for the engine and review binaries.
//!
//! Filtered by `RUST_LOG`. Persisted case, attempt and score records are the
//! product output and do not depend on the log level.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber.
///
/// ```bash
/// RUST_LOG=engine=debug engine replay case.toml script.toml
/// ```
///
/// Calling it twice is harmless; the second subscriber is dropped.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}
