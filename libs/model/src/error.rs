//! Error types for model parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating observed state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The task ID string is empty.
    #[error("task ID cannot be empty")]
    Empty,

    /// The task ID is missing the `__` instance separator.
    #[error("task ID missing '__' instance separator: {0}")]
    MissingSeparator(String),

    /// The instance portion of the task ID is not a valid UUID.
    #[error("invalid instance UUID in task ID '{id}': {message}")]
    InvalidInstanceUuid { id: String, message: String },

    /// The name portion of the task ID is not `{type}-{ordinal}-server`.
    #[error("malformed task name: {0}")]
    MalformedTaskName(String),

    /// A task record's `name` does not match the name encoded in its ID.
    #[error("task name '{name}' does not match ID '{id}'")]
    NameMismatch { id: String, name: String },

    /// The pod name is not `{type}-{ordinal}`.
    #[error("malformed pod name: {0}")]
    MalformedPodName(String),

    /// Two tasks in one snapshot share the same ID.
    #[error("duplicate task ID in snapshot: {0}")]
    DuplicateTaskId(String),
}
