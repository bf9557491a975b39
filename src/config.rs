//! Scheduler/engine configuration.

use std::time::Duration;

/// Default seconds between polling cycles.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default unread-list page size. Only the first result is processed
/// per cycle; the rest surface on later cycles.
const DEFAULT_PAGE_SIZE: u32 = 10;

/// Core triage configuration.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Sleep between workflow runs.
    pub poll_interval: Duration,
    /// Maximum unread messages requested from the mailbox per cycle.
    pub page_size: u32,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl TriageConfig {
    /// Build config from environment variables, falling back to defaults.
    ///
    /// - `TRIAGE_POLL_INTERVAL_SECS`
    /// - `TRIAGE_PAGE_SIZE`
    pub fn from_env() -> Self {
        let poll_secs: u64 = std::env::var("TRIAGE_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        let page_size: u32 = std::env::var("TRIAGE_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self {
            poll_interval: Duration::from_secs(poll_secs),
            page_size,
        }
    }
}
