// Holler — Server Module
//
// The loopback HTTP broker: an axum protocol layer over the request store,
// plus the idle watchdog that stops a broker nobody is using.

mod http;
pub mod protocol;
mod watchdog;

use std::time::Duration;

pub use http::{router, run, AppState, MAX_REQUEST_BODY};
pub use watchdog::WATCHDOG_INTERVAL;

/// Default broker port.
pub const DEFAULT_PORT: u16 = 9131;

/// Seconds without pending work before an idle broker exits.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Broker runtime configuration, filled in from CLI flags.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub port: u16,
    pub idle_timeout_secs: u64,
}

impl ServeConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}
