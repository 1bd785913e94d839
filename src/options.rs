//! Agent daemon options.
use serde::Serialize;

/// Agent sleep time between runs when nothing valid is declared.
pub const DEFAULT_DAEMON_PERIOD_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuntimeOptions {
    pub daemon_enabled: bool,
    pub daemon_period_ms: u64,
}

/// Resolve the daemon flag and period.
///
/// A disabled daemon always reports the default period; an enabled one keeps
/// the declared period only if it is strictly positive.
pub fn resolve_options(daemon_option: bool, daemon_period: i64) -> RuntimeOptions {
    let options = if daemon_option {
        RuntimeOptions {
            daemon_enabled: true,
            daemon_period_ms: u64::try_from(daemon_period)
                .ok()
                .filter(|period| *period > 0)
                .unwrap_or(DEFAULT_DAEMON_PERIOD_MS),
        }
    } else {
        RuntimeOptions {
            daemon_enabled: false,
            daemon_period_ms: DEFAULT_DAEMON_PERIOD_MS,
        }
    };
    tracing::debug!(daemon = options.daemon_enabled, "agent -daemon option");
    if options.daemon_enabled {
        tracing::debug!(period_ms = options.daemon_period_ms, "agent sleep time");
    }
    options
}
