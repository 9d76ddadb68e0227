//! Configuration for the harness.

use std::time::Duration;

use anyhow::Result;
use podcheck_converge::{PollConfig, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};

/// Harness configuration.
///
/// The service name and endpoints are explicit values threaded into
/// the collector and scenario runner at construction; nothing reads
/// the environment after startup.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Service (package) name the scenarios verify.
    pub service: String,

    /// Scheduler API base URL.
    pub scheduler_url: String,

    /// Distributed config-store base URL (lock-oracle scenario).
    pub store_url: String,

    /// Poll deadline and retry pacing.
    pub poll: PollConfig,
}

impl HarnessConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let service =
            std::env::var("PODCHECK_SERVICE").unwrap_or_else(|_| "proxylite".to_string());

        let scheduler_url = std::env::var("PODCHECK_SCHEDULER_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());

        let store_url = std::env::var("PODCHECK_STORE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8500".to_string());

        let timeout = std::env::var("PODCHECK_POLL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_TIMEOUT);

        let interval = std::env::var("PODCHECK_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        Ok(Self {
            service,
            scheduler_url,
            store_url,
            poll: PollConfig::new(timeout, interval),
        })
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            service: "proxylite".to_string(),
            scheduler_url: "http://127.0.0.1:8080".to_string(),
            store_url: "http://127.0.0.1:8500".to_string(),
            poll: PollConfig::default(),
        }
    }
}
