//! Tracing setup with a log level that can be changed after configuration loads.

use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

/// Level used until the configuration has been read.
const STARTUP_LEVEL: &str = "info";

static LOG_RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Installs the global subscriber. `RUST_LOG` wins over the startup level.
///
/// Calling this more than once is harmless; only the first call installs.
pub fn init_tracing() {
    let filter = match std::env::var_os("RUST_LOG") {
        Some(_) => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(STARTUP_LEVEL)),
        None => EnvFilter::new(STARTUP_LEVEL),
    };
    install(filter);
}

fn install(filter: EnvFilter) {
    let (reload_layer, handle) = reload::Layer::new(filter);
    if LOG_RELOAD_HANDLE.set(handle).is_err() {
        return;
    }

    let _ = tracing_subscriber::registry()
        .with(reload_layer)
        .with(fmt::layer())
        .try_init();
}

/// Applies `logging.level` from configuration unless `RUST_LOG` is set.
///
/// Returns `true` if the filter was replaced.
pub fn apply_logging_level(level: &str) -> bool {
    if std::env::var_os("RUST_LOG").is_some() {
        return false;
    }
    match LOG_RELOAD_HANDLE.get() {
        Some(handle) => handle.modify(|f| *f = EnvFilter::new(level)).is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_is_applied_after_init() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        init_tracing();
        init_tracing();
        assert!(apply_logging_level("debug"));
        assert!(apply_logging_level("warn"));
    }
}
