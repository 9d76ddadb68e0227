//! The observe-until-satisfied polling loop.

use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use crate::{DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};

/// Deadline and retry pacing for one convergence poll.
///
/// Both values are per-call inputs; the engine has no hardcoded
/// window of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Total time allowed from the first observation to success.
    pub timeout: Duration,

    /// Delay between a failed attempt and the next observation.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_POLL_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollConfig {
    /// Creates a config with an explicit timeout and interval.
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }
}

/// The outcome of evaluating a predicate against one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    satisfied: bool,
    message: String,
}

impl Verdict {
    /// The observation satisfied the predicate.
    pub fn pass() -> Self {
        Self {
            satisfied: true,
            message: String::new(),
        }
    }

    /// The observation did not satisfy the predicate. The message is
    /// surfaced in the timeout error if no later attempt succeeds.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            satisfied: false,
            message: message.into(),
        }
    }

    /// Whether the predicate was satisfied.
    pub fn is_satisfied(&self) -> bool {
        self.satisfied
    }

    /// The failure message (empty on a pass).
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors from the polling engine.
#[derive(Debug, Error)]
pub enum ConvergeError<T> {
    /// The deadline elapsed without the predicate ever passing.
    ///
    /// Carries the last observation and the predicate's last failure
    /// message so the caller can report expected-vs-observed state.
    #[error("no convergence after {attempts} attempts in {elapsed:?}: {last_message}")]
    Timeout {
        elapsed: Duration,
        attempts: u32,
        last_message: String,
        last: T,
    },
}

/// Repeatedly observes external state until `check` accepts an
/// observation or `config.timeout` elapses.
///
/// `observe` is called once per attempt and is expected to query live
/// state; the engine assumes nothing about its cost or purity across
/// retries. On success the accepted observation is returned
/// immediately. Between failed attempts the engine sleeps
/// `config.interval`; this is the only suspension point, and nothing
/// else is scheduled while a poll is in flight.
pub async fn poll_until<T, Obs, Fut, Chk>(
    mut observe: Obs,
    check: Chk,
    config: &PollConfig,
) -> Result<T, ConvergeError<T>>
where
    Obs: FnMut() -> Fut,
    Fut: Future<Output = T>,
    Chk: Fn(&T) -> Verdict,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let observation = observe().await;
        let verdict = check(&observation);

        if verdict.is_satisfied() {
            debug!(attempts, elapsed = ?start.elapsed(), "Poll converged");
            return Ok(observation);
        }

        debug!(
            attempts,
            elapsed = ?start.elapsed(),
            message = verdict.message(),
            "Poll attempt not yet satisfied"
        );

        if start.elapsed() >= config.timeout {
            return Err(ConvergeError::Timeout {
                elapsed: start.elapsed(),
                attempts,
                last_message: verdict.message().to_string(),
                last: observation,
            });
        }

        tokio::time::sleep(config.interval).await;
    }
}
