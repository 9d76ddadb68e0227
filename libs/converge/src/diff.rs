//! Identity-diff predicates over before/after task-ID sets.
//!
//! Given the baseline set of task IDs and a later observation of the
//! same prefix, these predicates classify what happened. Instance
//! UUIDs change on every restart or replace, so pure set algebra is
//! enough; whether a replaced task kept its agent is a separate
//! placement question the caller checks on the final snapshot.

use std::collections::BTreeSet;
use std::fmt::Display;

use crate::poll::Verdict;

/// True iff every baseline task has been torn down and replaced.
///
/// Holds when the sets are disjoint and the new set is at least as
/// large as the old one. Covers both in-place restart and full
/// replacement; the two differ only in agent affinity.
pub fn all_replaced<T: Ord>(old: &BTreeSet<T>, new: &BTreeSet<T>) -> bool {
    new.len() >= old.len() && old.is_disjoint(new)
}

/// True iff every baseline task persists unchanged.
///
/// Holds when the old set is a subset of the new one (only additions,
/// as in a pure scale-out). An empty baseline trivially passes for
/// any `new`; callers that need to prove "nothing happened" must also
/// check they actually had a baseline.
pub fn none_replaced<T: Ord>(old: &BTreeSet<T>, new: &BTreeSet<T>) -> bool {
    new.len() >= old.len() && old.is_subset(new)
}

fn render_sets<T: Ord + Display>(old: &BTreeSet<T>, new: &BTreeSet<T>) -> String {
    let old: Vec<String> = old.iter().map(ToString::to_string).collect();
    let new: Vec<String> = new.iter().map(ToString::to_string).collect();
    format!("old=[{}] new=[{}]", old.join(", "), new.join(", "))
}

/// [`all_replaced`] as a poll verdict with diagnostic sets.
pub fn all_replaced_verdict<T: Ord + Display>(old: &BTreeSet<T>, new: &BTreeSet<T>) -> Verdict {
    if all_replaced(old, new) {
        Verdict::pass()
    } else {
        Verdict::fail(format!(
            "baseline tasks not fully replaced: {}",
            render_sets(old, new)
        ))
    }
}

/// [`none_replaced`] as a poll verdict with diagnostic sets.
pub fn none_replaced_verdict<T: Ord + Display>(old: &BTreeSet<T>, new: &BTreeSet<T>) -> Verdict {
    if none_replaced(old, new) {
        Verdict::pass()
    } else {
        Verdict::fail(format!(
            "baseline tasks disturbed or missing: {}",
            render_sets(old, new)
        ))
    }
}
