//! # podcheck-model
//!
//! Data model for observed cluster state.
//!
//! ## Design Principles
//!
//! - Task identity is parsed and validated once, at the interface
//!   boundary; everything downstream operates on typed records
//! - Snapshots are immutable point-in-time captures; they are never
//!   patched after construction
//! - Pod names are derivable from task IDs and stable across restart
//!   and replace of the same ordinal
//!
//! ## Task ID Format
//!
//! Tasks use the scheduler's canonical format:
//! `{podType}-{ordinal}-server__{instanceUuid}`
//!
//! Examples:
//! - `proxylite-0-server__0b2ad917-bf32-4b31-83f4-6a64bd7e80b1`
//! - `world-2-server__84f7c1de-55a0-49a2-9e1c-0d3a2f9b6c17`
//!
//! The instance UUID changes on every restart or replace; the
//! `{podType}-{ordinal}` portion never does for the same pod.

mod error;
mod pod;
mod snapshot;
mod task;
mod wire;

pub use error::ModelError;
pub use pod::PodName;
pub use snapshot::Snapshot;
pub use task::{TaskId, TaskRecord, TaskState};
pub use wire::{PodInfoEntry, PodInfoSpec, PodInfoStatus, PodStatusTask, RawTask, TaskIdValue};
