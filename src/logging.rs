//! Tracing subscriber setup for console diagnostics.
//!
//! User-facing output (reports, completion messages) goes to stdout via the
//! command handlers; tracing carries debug detail on stderr. `RUST_LOG`
//! overrides the level chosen by the `--verbose` flag.

use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// Safe to call more than once; subsequent calls are ignored.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init(false);
        init(true);
    }
}
