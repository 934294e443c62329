//! Test log output

use tracing_subscriber::EnvFilter;

/// Route `tracing` output to the test harness.
///
/// Honors `RUST_LOG`, defaulting to `debug` for the cellmux crates. Safe to
/// call from every test; only the first call installs a subscriber.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cellmux=debug,cellmux_testkit=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
