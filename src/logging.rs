//! Tracing subscriber setup for hosts embedding the engine.
//!
//! The engine itself only emits `tracing` events; nothing is printed unless
//! the host installs a subscriber, either its own or the one below.

use tracing::{info, Level};
use tracing_subscriber::{filter::Directive, fmt, prelude::*, EnvFilter};

pub const LOG_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Installs a fmt subscriber at INFO for this crate. `RUST_LOG` still applies
/// to everything else.
pub fn init() {
    init_with_level(Level::INFO);
}

/// Like [`init`] with an explicit level. Calling it again after a global
/// subscriber is set is a no-op.
pub fn init_with_level(level: Level) {
    let mut filter = EnvFilter::from_default_env();
    if let Some(directive) = crate_directive(level) {
        filter = filter.add_directive(directive);
    }

    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

fn crate_directive(level: Level) -> Option<Directive> {
    format!("{}={}", LOG_TARGET, level).parse().ok()
}
