//! Log output setup.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Maximum level for a `-v` count.
pub fn level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Filter from `RUST_LOG` when set, else from the verbosity.
pub fn filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level(verbosity).into()))
}

/// Install the global subscriber, writing to stderr.
///
/// Does nothing if a subscriber is already installed.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbosity))
        .with_writer(std::io::stderr)
        .try_init();
}
