//! Logging Setup
//!
//! Initializes the global tracing subscriber. `RUST_LOG` takes precedence;
//! otherwise the settings file's debug flag picks between `info` and `debug`.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber. Safe to call more than once; later
/// calls are no-ops.
pub fn init(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
