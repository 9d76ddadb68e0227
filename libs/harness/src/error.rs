//! Error taxonomy for the harness.
//!
//! Only transient observation noise is ever recovered (inside the
//! collector); everything else aborts the running scenario with full
//! diagnostic context. There is no partial-success state.

use thiserror::Error;

use podcheck_invariants::InvariantViolation;
use podcheck_model::ModelError;

/// Errors from the scheduler and config-store clients.
///
/// The transient/fatal split is decided here, once, so the retry
/// behavior upstream is driven by type rather than by guessing which
/// failures are safe to swallow.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint was temporarily unreachable or momentarily
    /// inconsistent (connect/timeout errors, 5xx). Safe to treat as
    /// "no data yet" inside a poll.
    #[error("transient query failure: {message}")]
    Transient { message: String },

    /// The request was rejected (4xx). Not retried.
    #[error("request rejected: {status} {body}")]
    Rejected { status: u16, body: String },

    /// The response did not match the expected schema. A programmer
    /// or contract error, reported immediately.
    #[error("malformed response from {endpoint}: {message}")]
    Schema { endpoint: String, message: String },
}

impl ClientError {
    /// Classify a reqwest transport error.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        ClientError::Transient {
            message: err.to_string(),
        }
    }

    /// Classify a non-success HTTP status.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if status.is_server_error() {
            ClientError::Transient {
                message: format!("{status}: {body}"),
            }
        } else {
            ClientError::Rejected {
                status: status.as_u16(),
                body,
            }
        }
    }

    /// Returns true if this failure may resolve on its own.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transient { .. })
    }
}

/// A scenario-level failure.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The single triggering operation failed. Never retried.
    #[error("triggering operation failed: {0}")]
    Trigger(#[source] anyhow::Error),

    /// The poll deadline elapsed before the expectation held.
    #[error(
        "scenario '{scenario}' did not converge after {attempts} attempts in {elapsed:?}: \
         {last_message} (baseline=[{baseline}] observed=[{observed}])"
    )]
    Timeout {
        scenario: String,
        attempts: u32,
        elapsed: std::time::Duration,
        last_message: String,
        baseline: String,
        observed: String,
    },

    /// An invariant checker found a concrete contract breach.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    /// A non-transient external failure (rejected request or
    /// unparseable response schema).
    #[error("fatal external error: {0}")]
    External(#[source] ClientError),

    /// An observed payload failed model validation.
    #[error("invalid observed state: {0}")]
    Model(#[from] ModelError),

    /// A post-convergence assertion on the final snapshot failed.
    #[error("scenario '{scenario}' assertion failed: {message}")]
    Assertion { scenario: String, message: String },

    /// The config-store blob changed across the observation window.
    #[error("config-store blob at '{path}' changed: {before_digest} -> {after_digest}")]
    StoreMutated {
        path: String,
        before_digest: String,
        after_digest: String,
    },
}

impl From<ClientError> for HarnessError {
    fn from(err: ClientError) -> Self {
        HarnessError::External(err)
    }
}
