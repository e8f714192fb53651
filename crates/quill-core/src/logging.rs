//! `tracing` subscriber initialization.
//!
//! Log levels are controlled through `QUILL_LOG` (falling back to the
//! standard `RUST_LOG` syntax), defaulting to `info`.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; subsequent calls are no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env("QUILL_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
