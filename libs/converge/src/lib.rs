//! Convergence primitives.
//!
//! This library provides the generic observe-until-satisfied loop and
//! the identity-diff predicates used to decide what an operator-
//! triggered change actually did to a task set. Key concepts:
//!
//! - **Observation**: One live query of external state. Observations
//!   are never cached or deduplicated; every poll attempt re-queries.
//! - **Verdict**: The predicate's answer for one observation, with a
//!   human-readable message kept for timeout diagnostics.
//! - **Convergence**: Repeated observation stabilizing to a state the
//!   predicate accepts, within a caller-supplied deadline.
//!
//! # Invariants
//!
//! - Predicates are pure functions of their inputs
//! - The engine never retries past the deadline
//! - During an observation window task sets only grow or swap
//!   atomically, never shrink below the baseline count

mod diff;
mod poll;

pub use diff::{all_replaced, all_replaced_verdict, none_replaced, none_replaced_verdict};
pub use poll::{poll_until, ConvergeError, PollConfig, Verdict};

use std::time::Duration;

/// Default deadline for a convergence poll.
///
/// Rollouts on a busy cluster can take minutes; scenarios that expect
/// faster convergence override this through [`PollConfig`].
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(12 * 60);

/// Default delay between poll attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
