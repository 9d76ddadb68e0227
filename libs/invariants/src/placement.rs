//! Anti-colocation checking.

use std::collections::BTreeMap;

use podcheck_model::Snapshot;

use crate::error::InvariantViolation;

/// Checks that no two tasks of one pod type share an agent.
///
/// Tasks are partitioned by the longest matching entry in `pod_types`
/// (matched as a `{type}-` name prefix, so `proxy` and `proxylite`
/// can coexist). A task whose name matches no entry is a
/// classification error, never silently skipped.
pub fn check_no_colocation(
    snapshot: &Snapshot,
    pod_types: &[&str],
) -> Result<(), InvariantViolation> {
    // pod type -> agent -> task names placed there
    let mut placements: BTreeMap<&str, BTreeMap<&str, Vec<String>>> = BTreeMap::new();

    for task in snapshot.tasks() {
        let pod_type = pod_types
            .iter()
            .copied()
            .filter(|t| task.name.starts_with(&format!("{t}-")))
            .max_by_key(|t| t.len())
            .ok_or_else(|| InvariantViolation::UnknownPodType {
                task_name: task.name.clone(),
                known_types: pod_types.iter().map(ToString::to_string).collect(),
            })?;

        placements
            .entry(pod_type)
            .or_default()
            .entry(task.agent_id.as_str())
            .or_default()
            .push(task.name.clone());
    }

    for (pod_type, agents) in &placements {
        for (agent_id, tasks) in agents {
            if tasks.len() > 1 {
                return Err(InvariantViolation::Colocation {
                    pod_type: (*pod_type).to_string(),
                    agent_id: (*agent_id).to_string(),
                    tasks: tasks.clone(),
                });
            }
        }
    }

    Ok(())
}
