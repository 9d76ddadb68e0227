//! Invariant checkers for observed cluster state.
//!
//! These run against validated snapshots and pod listings after a
//! scenario has converged:
//!
//! - **Placement**: no two instances of one pod type share an agent
//! - **Ordering**: pod listings are type-major, lexicographic by type,
//!   with dense ascending ordinals
//!
//! Checkers are pure; a violation names the offending entities so a
//! failing scenario can be diagnosed without re-querying the cluster.

mod error;
mod ordering;
mod placement;

pub use error::InvariantViolation;
pub use ordering::check_pod_list_order;
pub use placement::check_no_colocation;
