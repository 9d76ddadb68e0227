//! Wire shapes for external interfaces.
//!
//! These structs mirror what the scheduler actually sends, including
//! legacy field spellings. They are deserialization targets only;
//! validation into typed records happens in one place
//! ([`crate::TaskRecord::from_raw`]) so the rest of the harness never
//! touches raw payloads.

use serde::{Deserialize, Serialize};

/// A raw task descriptor from the inventory query.
///
/// The agent field accepts both the current `agent_id` spelling and
/// the legacy `slave_id` one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTask {
    /// Opaque task ID string.
    pub id: String,

    /// Task name.
    pub name: String,

    /// Agent hosting the task.
    #[serde(alias = "slave_id")]
    pub agent_id: String,

    /// Lifecycle state string (`TASK_RUNNING`, ...).
    pub state: String,
}

/// One entry of a `pods status` response: `{id, name, state}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodStatusTask {
    pub id: String,
    pub name: String,
    pub state: String,
}

/// Wrapper the scheduler uses for ID values: `{"value": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskIdValue {
    pub value: String,
}

/// The desired-spec half of a `pods info` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodInfoSpec {
    pub name: String,

    #[serde(rename = "taskId")]
    pub task_id: TaskIdValue,

    #[serde(rename = "slaveId")]
    pub agent_id: TaskIdValue,
}

/// The observed-state half of a `pods info` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodInfoStatus {
    #[serde(rename = "taskId")]
    pub task_id: TaskIdValue,

    pub state: String,
}

/// One entry of a `pods info` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodInfoEntry {
    pub info: PodInfoSpec,
    pub status: PodInfoStatus,
}

impl PodInfoEntry {
    /// Returns true if the desired and observed task IDs agree.
    pub fn ids_agree(&self) -> bool {
        self.info.task_id.value == self.status.task_id.value
    }
}
