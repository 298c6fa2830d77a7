//! Diagnostic logging to stderr.
//!
//! Stdout is reserved for query results, so every log line goes to stderr.
//! `RUST_LOG` overrides the verbosity picked on the command line.

use tracing_subscriber::EnvFilter;

/// Level for this crate given the number of `-v` flags.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn default_directives(verbosity: u8) -> String {
    let level = level_for(verbosity);
    format!("warn,webos_remote={level},wtv={level}")
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
