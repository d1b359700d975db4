//! Diagnostic logging setup.
//!
//! Logs go to stderr so they never mix with command output on stdout.
//! `RUST_LOG` overrides the level picked from the command-line flags.

use tracing_subscriber::{fmt, EnvFilter};

/// Default directive for the given verbosity flags.
fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

/// Installs the global subscriber. Safe to call once per process; later
/// calls are ignored.
pub fn init_logging(verbose: bool, quiet: bool, use_colors: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(default_directive(verbose, quiet))
    };

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_ansi(use_colors)
        .try_init();
}
