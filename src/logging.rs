// 🪵 Logging setup shared by the CLI and the server

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. RUST_LOG wins over the configured filter.
///
/// Logs go to stderr so they never mix with report output on stdout.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
