//! Diagnostic logging.
//!
//! Diagnostics go to stderr so stdout carries only the ping output. The
//! filter comes from `RUST_LOG` when set, otherwise from the configured level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging subsystem
///
/// Calling it again after a subscriber is installed is a no-op.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init_logging("debug");
        init_logging("warn");
        tracing::debug!("logging initialised");
    }
}
