//! Tracing subscriber setup for binaries and FFI hosts.
//!
//! `RUST_LOG` wins when set. Otherwise `verbose` picks debug for this
//! workspace's crates, and info for them by default.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const CRATES: [&str; 3] = ["medsupply_core", "medsupply_ffi", "mock_server"];

fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    let directives: Vec<String> = CRATES.iter().map(|name| format!("{name}={level}")).collect();
    format!("{},warn", directives.join(","))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init();
}
