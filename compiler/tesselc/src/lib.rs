//! Tessel command-line driver.
//!
//! The binary (`tessel`) is a thin argument dispatcher; everything it runs
//! lives in [`commands`] so it can be tested directly.

pub mod commands;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the `tracing` subscriber.
///
/// Filtering follows `RUST_LOG` (e.g. `RUST_LOG=tessel_isel=trace`). Without
/// it nothing is logged unless `verbose` is set, which enables `debug`.
/// Safe to call more than once.
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            return;
        };
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .init();
    });
}
