//! Diagnostic tracing for the CLI.
//!
//! Reads `RUST_LOG`, defaulting to `warn`, and writes compact lines to
//! stderr so they never mix with command output on stdout.
//!
//! ```bash
//! RUST_LOG=timerqueue_core=debug timerqueue run
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
