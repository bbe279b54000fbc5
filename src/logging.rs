//! Structured logging initialization for the `testintel-cli` shell.
//!
//! Grounded on the original binary's `main.rs`, which logs to stderr (to
//! keep stdout clean for the structured query output) and derives its
//! filter from `--verbose` or `RUST_LOG`, defaulting to `warn`.

use tracing_subscriber::EnvFilter;

/// Initialize the global `tracing` subscriber. `verbose` corresponds to the
/// CLI's `--verbose` flag and forces `debug` regardless of `RUST_LOG`.
///
/// Idempotent in the sense that a second call is a harmless no-op (the
/// underlying `try_init` swallows the "already set" error), which matters
/// for integration tests that construct a CLI command more than once per
/// process.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_does_not_panic_when_called_twice() {
        init(false);
        init(true);
    }
}
