//! Point-in-time snapshots of observed tasks.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ModelError;
use crate::task::{TaskId, TaskRecord};

/// An immutable point-in-time capture of a service's tasks.
///
/// Constructed once by the collector and read-only thereafter. The
/// constructor enforces that task IDs are pairwise distinct; a
/// duplicate means the inventory response itself is broken.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    service: String,
    taken_at: DateTime<Utc>,
    tasks: Vec<TaskRecord>,
}

impl Snapshot {
    /// Creates a snapshot from validated task records.
    pub fn new(service: impl Into<String>, tasks: Vec<TaskRecord>) -> Result<Self, ModelError> {
        let mut seen = HashSet::with_capacity(tasks.len());
        for task in &tasks {
            if !seen.insert(&task.id) {
                return Err(ModelError::DuplicateTaskId(task.id.to_string()));
            }
        }

        Ok(Self {
            service: service.into(),
            taken_at: Utc::now(),
            tasks,
        })
    }

    /// Creates an empty snapshot, used when the inventory is
    /// transiently unreachable ("no data yet").
    pub fn empty(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            taken_at: Utc::now(),
            tasks: Vec::new(),
        }
    }

    /// The service this snapshot was collected from.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// When the snapshot was captured.
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// All task records, in inventory order.
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    /// Number of tasks observed.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if no tasks were observed.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The set of all task IDs.
    pub fn task_ids(&self) -> BTreeSet<TaskId> {
        self.tasks.iter().map(|t| t.id.clone()).collect()
    }

    /// Task IDs whose name starts with `prefix`.
    pub fn ids_with_prefix(&self, prefix: &str) -> BTreeSet<TaskId> {
        self.tasks
            .iter()
            .filter(|t| t.name.starts_with(prefix))
            .map(|t| t.id.clone())
            .collect()
    }

    /// Task records whose name starts with `prefix`.
    pub fn tasks_with_prefix(&self, prefix: &str) -> Vec<&TaskRecord> {
        self.tasks
            .iter()
            .filter(|t| t.name.starts_with(prefix))
            .collect()
    }

    /// The agent hosting the named pod's task, if observed.
    pub fn agent_of(&self, pod_name: &str) -> Option<&str> {
        self.tasks
            .iter()
            .find(|t| t.pod().to_string() == pod_name)
            .map(|t| t.agent_id.as_str())
    }
}
