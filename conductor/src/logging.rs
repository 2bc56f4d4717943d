//! Development-time tracing for debugging the conductor.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Dev diagnostics via `RUST_LOG` or `-v`, output
//!   to stderr. Not persisted, not part of conductor product output.
//!
//! - **Turn logging (`io/turn_log`)**: Product artifacts in
//!   `.conductor/turns/`. Always written, unaffected by log level.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise `verbosity` picks the level for this
/// crate (0 = warn, 1 = info, 2+ = debug) and everything else stays at warn.
///
/// # Example
/// ```bash
/// RUST_LOG=conductor=debug conductor turn --response reply.md
/// conductor -vv decode batch --response reply.md
/// ```
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn default_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    format!("warn,conductor={level}")
}
