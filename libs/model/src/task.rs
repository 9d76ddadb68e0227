//! Task identity and task records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ModelError;
use crate::pod::PodName;
use crate::wire::RawTask;

/// Suffix the scheduler appends to pod names for server tasks.
const SERVER_SUFFIX: &str = "-server";

/// Separator between the task name and the instance UUID.
const INSTANCE_SEPARATOR: &str = "__";

/// Task lifecycle state as reported by the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// The task is running.
    Running,
    /// The task is staging (launching, not yet running).
    Staging,
    /// The task has failed.
    Failed,
    /// Any other state is passed through unmodified.
    Other(String),
}

impl TaskState {
    /// Wire spelling used by the inventory (`TASK_RUNNING` etc.).
    pub fn as_str(&self) -> &str {
        match self {
            TaskState::Running => "TASK_RUNNING",
            TaskState::Staging => "TASK_STAGING",
            TaskState::Failed => "TASK_FAILED",
            TaskState::Other(s) => s,
        }
    }

    /// Returns true if the task is running.
    pub fn is_running(&self) -> bool {
        matches!(self, TaskState::Running)
    }
}

impl From<&str> for TaskState {
    fn from(s: &str) -> Self {
        match s {
            "TASK_RUNNING" => TaskState::Running,
            "TASK_STAGING" => TaskState::Staging,
            "TASK_FAILED" => TaskState::Failed,
            other => TaskState::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for TaskState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(TaskState::from(s.as_str()))
    }
}

/// A validated task ID.
///
/// Global format: `{podType}-{ordinal}-server__{instanceUuid}`. The
/// instance UUID changes on every restart or replace, so set
/// membership of task IDs distinguishes "same task still running"
/// from "task was torn down and relaunched".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId {
    raw: String,
    // Byte offset of the INSTANCE_SEPARATOR within `raw`.
    name_len: usize,
    pod: PodName,
}

impl TaskId {
    /// Parses and validates a task ID string.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        if s.is_empty() {
            return Err(ModelError::Empty);
        }

        let Some((name, instance)) = s.split_once(INSTANCE_SEPARATOR) else {
            return Err(ModelError::MissingSeparator(s.to_string()));
        };

        Uuid::parse_str(instance).map_err(|e| ModelError::InvalidInstanceUuid {
            id: s.to_string(),
            message: e.to_string(),
        })?;

        let Some(pod_str) = name.strip_suffix(SERVER_SUFFIX) else {
            return Err(ModelError::MalformedTaskName(name.to_string()));
        };
        let pod =
            PodName::parse(pod_str).map_err(|_| ModelError::MalformedTaskName(name.to_string()))?;

        Ok(Self {
            raw: s.to_string(),
            name_len: name.len(),
            pod,
        })
    }

    /// The full task ID string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The task name: the ID with the instance UUID stripped
    /// (e.g. `proxylite-0-server`). Stable across restart and replace.
    pub fn task_name(&self) -> &str {
        &self.raw[..self.name_len]
    }

    /// The instance UUID portion of the ID.
    pub fn instance_uuid(&self) -> &str {
        &self.raw[self.name_len + INSTANCE_SEPARATOR.len()..]
    }

    /// The pod this task belongs to (e.g. `proxylite-0`).
    pub fn pod(&self) -> &PodName {
        &self.pod
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl std::str::FromStr for TaskId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TaskId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A validated task record observed from the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    /// Globally unique task ID.
    pub id: TaskId,

    /// Task name (`{pod}-server`); always the ID's name prefix.
    pub name: String,

    /// Agent (host) the task is placed on.
    pub agent_id: String,

    /// Reported lifecycle state.
    pub state: TaskState,
}

impl TaskRecord {
    /// Validates a raw inventory descriptor into a task record.
    ///
    /// This is the single validating parse step at the interface
    /// boundary; checkers only ever see records that passed it.
    pub fn from_raw(raw: RawTask) -> Result<Self, ModelError> {
        let id = TaskId::parse(&raw.id)?;

        if raw.name != id.task_name() {
            return Err(ModelError::NameMismatch {
                id: raw.id,
                name: raw.name,
            });
        }

        Ok(Self {
            id,
            name: raw.name,
            agent_id: raw.agent_id,
            state: TaskState::from(raw.state.as_str()),
        })
    }

    /// The pod this task belongs to.
    pub fn pod(&self) -> &PodName {
        self.id.pod()
    }
}

impl TryFrom<RawTask> for TaskRecord {
    type Error = ModelError;

    fn try_from(raw: RawTask) -> Result<Self, Self::Error> {
        Self::from_raw(raw)
    }
}
