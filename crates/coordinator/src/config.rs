// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the coordinator binary: one
//! function per knob, aggregated by [`Config::load`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Coordinator-wide configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the RPC listener binds to.
    pub listen_addr: SocketAddr,
    /// `T_poll`: period between `QueuePoller` cycles.
    pub poll_period: Duration,
    /// `N_complete_retries`: retry budget for the `compactionCompleted`
    /// tablet-server notification.
    pub completion_retry_budget: u32,
    /// `T_retry_max`: cap on backoff between retries.
    pub retry_max_backoff: Duration,
    /// Path to the leader-lock PID file.
    pub lock_path: PathBuf,
    /// Cap on a single wire frame's payload size.
    pub max_message_bytes: usize,
    /// Timeout applied to each individual outbound RPC attempt.
    pub rpc_timeout: Duration,
    /// Floor on the tokio runtime's worker-thread pool.
    pub min_worker_threads: usize,
    /// Whether to try nearby ports if `listen_addr`'s port is taken.
    pub port_search: bool,
}

impl Config {
    /// Load configuration from `CC_*` environment variables, falling back to
    /// the defaults documented on each accessor below.
    pub fn load() -> Result<Self, crate::error::RuntimeError> {
        Ok(Self {
            listen_addr: listen_addr(),
            poll_period: poll_period(),
            completion_retry_budget: completion_retry_budget(),
            retry_max_backoff: retry_max_backoff(),
            lock_path: lock_path(),
            max_message_bytes: max_message_bytes(),
            rpc_timeout: rpc_timeout(),
            min_worker_threads: min_worker_threads(),
            port_search: port_search(),
        })
    }
}

/// `CC_LISTEN_ADDR` (default `0.0.0.0:9997`).
pub fn listen_addr() -> SocketAddr {
    std::env::var("CC_LISTEN_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| ([0, 0, 0, 0], 9997).into())
}

/// `CC_POLL_PERIOD_MS` (default 60 s; `T_poll`, the period between poll cycles).
pub fn poll_period() -> Duration {
    std::env::var("CC_POLL_PERIOD_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(60))
}

/// `CC_COMPLETION_RETRY_BUDGET` (default 10; `N_complete_retries`).
pub fn completion_retry_budget() -> u32 {
    std::env::var("CC_COMPLETION_RETRY_BUDGET").ok().and_then(|s| s.parse().ok()).unwrap_or(10)
}

/// `CC_RETRY_MAX_BACKOFF_MS` (default 30 s; `T_retry_max`).
pub fn retry_max_backoff() -> Duration {
    std::env::var("CC_RETRY_MAX_BACKOFF_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// `CC_LOCK_PATH` (default `$XDG_STATE_HOME/cc-coordinator/coordinator.pid`,
/// falling back to `~/.local/state/cc-coordinator/coordinator.pid`).
pub fn lock_path() -> PathBuf {
    if let Ok(path) = std::env::var("CC_LOCK_PATH") {
        return PathBuf::from(path);
    }
    state_dir().join("coordinator.pid")
}

fn state_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("cc-coordinator");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local/state/cc-coordinator")
}

/// `CC_MAX_MESSAGE_BYTES` (default [`cc_wire::DEFAULT_MAX_MESSAGE_BYTES`]).
pub fn max_message_bytes() -> usize {
    std::env::var("CC_MAX_MESSAGE_BYTES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(cc_wire::DEFAULT_MAX_MESSAGE_BYTES)
}

/// `CC_RPC_TIMEOUT_MS` (default 5 s).
pub fn rpc_timeout() -> Duration {
    std::env::var("CC_RPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// `CC_MIN_WORKER_THREADS` (default 4): floor on the tokio runtime's
/// worker-thread pool, since every RPC handler and the poller/reactor tasks
/// share it.
pub fn min_worker_threads() -> usize {
    std::env::var("CC_MIN_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(4)
}

/// `CC_PORT_SEARCH` (default `false`): if the configured listen port is
/// already taken, try nearby ports instead of failing to bind.
pub fn port_search() -> bool {
    std::env::var("CC_PORT_SEARCH").ok().and_then(|s| s.parse().ok()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn poll_period_falls_back_to_sixty_seconds() {
        std::env::remove_var("CC_POLL_PERIOD_MS");
        assert_eq!(poll_period(), Duration::from_secs(60));
    }

    #[test]
    #[serial]
    fn poll_period_honors_override() {
        std::env::set_var("CC_POLL_PERIOD_MS", "1500");
        assert_eq!(poll_period(), Duration::from_millis(1500));
        std::env::remove_var("CC_POLL_PERIOD_MS");
    }

    #[test]
    #[serial]
    fn completion_retry_budget_defaults_to_ten() {
        std::env::remove_var("CC_COMPLETION_RETRY_BUDGET");
        assert_eq!(completion_retry_budget(), 10);
    }

    #[test]
    #[serial]
    fn listen_addr_parses_an_override() {
        std::env::set_var("CC_LISTEN_ADDR", "127.0.0.1:1234");
        assert_eq!(listen_addr(), "127.0.0.1:1234".parse().unwrap());
        std::env::remove_var("CC_LISTEN_ADDR");
    }

    #[test]
    #[serial]
    fn min_worker_threads_falls_back_to_four() {
        std::env::remove_var("CC_MIN_WORKER_THREADS");
        assert_eq!(min_worker_threads(), 4);
    }

    #[test]
    #[serial]
    fn min_worker_threads_ignores_a_zero_override() {
        std::env::set_var("CC_MIN_WORKER_THREADS", "0");
        assert_eq!(min_worker_threads(), 4);
        std::env::remove_var("CC_MIN_WORKER_THREADS");
    }

    #[test]
    #[serial]
    fn min_worker_threads_honors_override() {
        std::env::set_var("CC_MIN_WORKER_THREADS", "8");
        assert_eq!(min_worker_threads(), 8);
        std::env::remove_var("CC_MIN_WORKER_THREADS");
    }

    #[test]
    #[serial]
    fn port_search_defaults_to_off() {
        std::env::remove_var("CC_PORT_SEARCH");
        assert!(!port_search());
    }

    #[test]
    #[serial]
    fn port_search_honors_override() {
        std::env::set_var("CC_PORT_SEARCH", "true");
        assert!(port_search());
        std::env::remove_var("CC_PORT_SEARCH");
    }
}
