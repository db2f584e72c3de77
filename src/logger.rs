//! Subscriber setup for the `quat_convert` binary.
//!
//! The library only emits events: `debug!` once per batched conversion, `trace!` when a
//! stability branch is taken and `warn!` when a rotation matrix is rejected. Output goes
//! to stderr so it never mixes with the CSV that `quat_convert` writes to stdout.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber at INFO, overridable through `RUST_LOG`.
pub fn init_logger() {
    init_logger_with_level(Level::INFO)
}

/// Install a stderr subscriber with `default_level` unless `RUST_LOG` sets one.
///
/// Later calls leave the first subscriber in place.
pub fn init_logger_with_level(default_level: Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_initialization_is_ignored() {
        init_logger_with_level(Level::DEBUG);
        init_logger();
        tracing::debug!("logger installed");
    }
}
