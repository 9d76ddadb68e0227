//! Snapshot collection.

use tracing::warn;

use podcheck_model::{Snapshot, TaskRecord};

use crate::client::SchedulerClient;
use crate::error::HarnessError;

/// Collects validated snapshots from the task inventory.
///
/// This is the only place transient query noise is recovered: a
/// transiently unreachable inventory yields an **empty** snapshot,
/// which the polling layer treats as "no data yet". A malformed
/// response schema or rejected request is fatal and surfaces
/// immediately.
#[derive(Debug, Clone)]
pub struct SnapshotCollector {
    client: SchedulerClient,
}

impl SnapshotCollector {
    /// Create a collector over a scheduler client.
    pub fn new(client: SchedulerClient) -> Self {
        Self { client }
    }

    /// Capture a snapshot of the service's tasks, optionally filtered
    /// to names starting with `name_prefix`.
    pub async fn collect(&self, name_prefix: Option<&str>) -> Result<Snapshot, HarnessError> {
        let service = self.client.service().to_string();

        let raw = match self.client.list_tasks().await {
            Ok(raw) => raw,
            Err(err) if err.is_transient() => {
                warn!(service = %service, error = %err, "Inventory unreachable, treating as empty");
                return Ok(Snapshot::empty(service));
            }
            Err(err) => return Err(err.into()),
        };

        let tasks = raw
            .into_iter()
            .filter(|t| name_prefix.is_none_or(|p| t.name.starts_with(p)))
            .map(TaskRecord::from_raw)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Snapshot::new(service, tasks)?)
    }
}
