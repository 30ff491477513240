//! Console logging.
//!
//! Library code logs through the `log` facade; the binary installs a
//! `tracing-subscriber` formatter that also picks up those records.
//! `RUST_LOG` overrides the default level.

use std::error::Error;
use tracing_subscriber::EnvFilter;

/// Default filter directive for a run.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Installs the global subscriber, writing to stderr so stdout stays free for
/// feature output.
///
/// # Errors
///
/// Fails when a global subscriber or logger is already installed.
pub fn init_logging(debug: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
}
