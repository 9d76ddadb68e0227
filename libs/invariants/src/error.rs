//! Violation types reported by the checkers.

use thiserror::Error;

/// A concrete breach of a placement or ordering contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Two tasks of one pod type are placed on the same agent.
    #[error("pod type '{pod_type}' colocated on agent '{agent_id}': {tasks:?}")]
    Colocation {
        pod_type: String,
        agent_id: String,
        tasks: Vec<String>,
    },

    /// A task name matched none of the expected pod type prefixes.
    #[error("unknown pod type for task '{task_name}', expected one of {known_types:?}")]
    UnknownPodType {
        task_name: String,
        known_types: Vec<String>,
    },

    /// The pod listing has the wrong total length.
    #[error("pod list has {actual} entries, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// An entry is out of place in the pod listing.
    #[error("pod list entry {index} is '{actual}', expected '{expected}'")]
    OutOfOrder {
        index: usize,
        expected: String,
        actual: String,
    },
}
