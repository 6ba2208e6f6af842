//! Logging init: structured tracing output on stderr.
//!
//! stdout is left to the progress and completion messages so that it can be
//! piped or grepped independently of the diagnostics.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,bunny_logpull=info";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
