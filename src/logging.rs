//! Tracing setup for the cm binary.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize `tracing`, writing to stderr so it never mixes with command output.
///
/// Quiet by default; set `RUST_LOG=cm=debug` to see store and launch events.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}
