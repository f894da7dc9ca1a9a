//! Logging initialisation via tracing-subscriber.
//!
//! Invoked by [`Client::new`](crate::Client::new) when `enable_log` is set.
//! `RUST_LOG` takes precedence when present; otherwise the option's level
//! is used. A second client in the same process keeps the first subscriber.

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

pub(crate) fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.directive()));

    // try_init fails if a subscriber is already installed — fine, keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
