//! Client options resolved once at init.

use std::time::Duration;

/// Default base URL for the Live API, version included.
pub const DEFAULT_BASE_URL: &str = "https://api.infiniteflight.com/public/v2/";

/// Legacy-style log level ladder. Higher-priority messages are always shown
/// when logging is enabled: `Mandatory` shows the least, `Info` the most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    #[default]
    Mandatory,
    Error,
    Warn,
    Info,
}

impl LogLevel {
    /// Filter directive handed to tracing-subscriber. `Mandatory` keeps only
    /// errors — there is no quieter tracing level to map it to.
    pub(crate) fn directive(self) -> &'static str {
        match self {
            LogLevel::Mandatory | LogLevel::Error => "iflive=error",
            LogLevel::Warn => "iflive=warn",
            LogLevel::Info => "iflive=info",
        }
    }
}

/// Options accepted by [`Client::new`](crate::Client::new).
///
/// The defaults mirror how the API is normally used: logging off, event
/// delivery, production base URL, 30-second request timeout.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Install a tracing subscriber when true.
    pub enable_log: bool,
    /// Verbosity when logging is enabled.
    pub log_level: LogLevel,
    /// `true` selects callback delivery; `false` selects event delivery.
    pub use_callback: bool,
    /// Base URL every resolved path is appended to. Must end with `/`.
    pub base_url: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Broadcast channel capacity for event delivery.
    pub channel_capacity: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            enable_log: false,
            log_level: LogLevel::Mandatory,
            use_callback: false,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            channel_capacity: 64,
        }
    }
}
