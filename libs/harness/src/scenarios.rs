//! Stock scenarios.
//!
//! Constructors for the standard verification suite: scale-out,
//! replacement-forcing config bump, pod restart/replace, pod-surface
//! shape checks, and the lock oracle. Each returns a [`ScenarioSpec`]
//! (or runs directly, for the non-polling surface checks); composing
//! new scenarios from the same pieces is the intended extension point.

use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::Context as _;
use tracing::info;

use podcheck_model::TaskId;

use crate::client::SchedulerClient;
use crate::error::HarnessError;
use crate::scenario::{Expectation, FinalCount, PostChecks, ScenarioReport, ScenarioSpec, Trigger};

fn upper_env_key(pod_type: &str, suffix: &str) -> String {
    format!("{}_{}", pod_type.to_uppercase().replace('-', "_"), suffix)
}

/// Scale a pod type out by one instance via its `{TYPE}_COUNT` config
/// parameter. Existing tasks must survive untouched.
pub fn scale_out(client: &SchedulerClient, pod_type: &str) -> ScenarioSpec {
    let trigger_client = client.clone();
    let key = upper_env_key(pod_type, "COUNT");

    let trigger: Trigger = Box::new(move || {
        Box::pin(async move {
            let mut config = trigger_client.get_app_config().await?;
            let count: u32 = config
                .env
                .get(&key)
                .with_context(|| format!("app config missing '{key}'"))?
                .parse()
                .with_context(|| format!("'{key}' is not an integer"))?;
            config.env.insert(key, (count + 1).to_string());
            trigger_client.put_app_config(&config).await?;
            Ok(())
        })
    });

    ScenarioSpec {
        name: format!("scale_out_{pod_type}"),
        prefix: format!("{pod_type}-"),
        expectation: Expectation::NoneReplaced,
        trigger,
        checks: PostChecks {
            final_count: FinalCount::BaselinePlus(1),
            ..PostChecks::default()
        },
    }
}

/// Bump a pod type's `{TYPE}_CPUS` config parameter by 0.1. The
/// scheduler relaunches every task of the type for a resource change,
/// so the full task set must be replaced.
pub fn config_bump(client: &SchedulerClient, pod_type: &str) -> ScenarioSpec {
    let trigger_client = client.clone();
    let key = upper_env_key(pod_type, "CPUS");

    let trigger: Trigger = Box::new(move || {
        Box::pin(async move {
            let mut config = trigger_client.get_app_config().await?;
            let cpus: f64 = config
                .env
                .get(&key)
                .with_context(|| format!("app config missing '{key}'"))?
                .parse()
                .with_context(|| format!("'{key}' is not a number"))?;
            config.env.insert(key, format!("{}", cpus + 0.1));
            trigger_client.put_app_config(&config).await?;
            Ok(())
        })
    });

    ScenarioSpec {
        name: format!("config_bump_{pod_type}"),
        prefix: format!("{pod_type}-"),
        expectation: Expectation::AllReplaced,
        trigger,
        checks: PostChecks {
            final_count: FinalCount::Baseline,
            ..PostChecks::default()
        },
    }
}

fn pod_command_trigger(
    client: &SchedulerClient,
    pod: &str,
    replace: bool,
) -> Trigger {
    let client = client.clone();
    let pod = pod.to_string();

    Box::new(move || {
        Box::pin(async move {
            let response = if replace {
                client.replace_pod(&pod).await?
            } else {
                client.restart_pod(&pod).await?
            };

            // The scheduler acknowledges with the pod and its task
            // names; anything else means the command hit the wrong
            // target.
            if response.pod != pod {
                anyhow::bail!("command acknowledged wrong pod: '{}'", response.pod);
            }
            let expected_task = format!("{pod}-server");
            if response.tasks != vec![expected_task.clone()] {
                anyhow::bail!(
                    "command acknowledged tasks {:?}, expected ['{expected_task}']",
                    response.tasks
                );
            }
            Ok(())
        })
    })
}

/// Restart a pod in place: its task must be relaunched with a fresh
/// instance UUID but stay on the same agent.
pub fn restart_pod(client: &SchedulerClient, pod: &str) -> ScenarioSpec {
    ScenarioSpec {
        name: format!("restart_{pod}"),
        prefix: format!("{pod}-"),
        expectation: Expectation::AllReplaced,
        trigger: pod_command_trigger(client, pod, false),
        checks: PostChecks {
            final_count: FinalCount::Baseline,
            agent_pinned: Some(pod.to_string()),
            ..PostChecks::default()
        },
    }
}

/// Replace a pod: its task must be relaunched with a fresh instance
/// UUID. Agent affinity is deliberately not asserted; the scheduler
/// may legitimately place the replacement back on the old agent.
pub fn replace_pod(client: &SchedulerClient, pod: &str) -> ScenarioSpec {
    ScenarioSpec {
        name: format!("replace_{pod}"),
        prefix: format!("{pod}-"),
        expectation: Expectation::AllReplaced,
        trigger: pod_command_trigger(client, pod, true),
        checks: PostChecks {
            final_count: FinalCount::Baseline,
            ..PostChecks::default()
        },
    }
}

/// A trigger that does nothing, for observation-only scenarios.
pub fn noop_trigger() -> Trigger {
    Box::new(|| Box::pin(async { Ok(()) }))
}

/// Validate the pod listing without touching the cluster: two
/// consecutive reads must agree, with canonical type-major ordering
/// and dense ordinals for the given counts.
pub fn pod_listing(expected_counts: BTreeMap<String, u32>) -> ScenarioSpec {
    ScenarioSpec {
        name: "pods_list".to_string(),
        prefix: String::new(),
        expectation: Expectation::NoneReplaced,
        trigger: noop_trigger(),
        checks: PostChecks {
            pod_list_counts: Some(expected_counts),
            ..PostChecks::default()
        },
    }
}

/// Validate anti-colocation for the given pod types without touching
/// the cluster.
pub fn placement(pod_types: &[&str]) -> ScenarioSpec {
    ScenarioSpec {
        name: "placement".to_string(),
        prefix: String::new(),
        expectation: Expectation::NoneReplaced,
        trigger: noop_trigger(),
        checks: PostChecks {
            colocation_pod_types: pod_types.iter().map(ToString::to_string).collect(),
            ..PostChecks::default()
        },
    }
}

fn assertion(scenario: &str, message: String) -> HarnessError {
    HarnessError::Assertion {
        scenario: scenario.to_string(),
        message,
    }
}

/// Validate the shape of every `pods status` entry: one task per pod,
/// IDs that parse and agree with the pod name, everything running.
/// `pod` is additionally fetched through the single-pod endpoint,
/// which must agree with its entry in the full listing.
pub async fn verify_pod_statuses(
    client: &SchedulerClient,
    pod: &str,
) -> Result<ScenarioReport, HarnessError> {
    const NAME: &str = "pods_status";
    let start = Instant::now();

    let statuses = client.pod_statuses().await?;
    for (pod, tasks) in &statuses {
        if tasks.len() != 1 {
            return Err(assertion(
                NAME,
                format!("pod '{pod}' reports {} tasks, expected 1", tasks.len()),
            ));
        }
        let task = &tasks[0];

        let id = TaskId::parse(&task.id)?;
        if id.pod().to_string() != *pod {
            return Err(assertion(
                NAME,
                format!("pod '{pod}' reports foreign task ID '{}'", task.id),
            ));
        }
        if task.name != id.task_name() {
            return Err(assertion(
                NAME,
                format!("task name '{}' disagrees with ID '{}'", task.name, task.id),
            ));
        }
        if task.state != "TASK_RUNNING" {
            return Err(assertion(
                NAME,
                format!("pod '{pod}' task is {}, expected TASK_RUNNING", task.state),
            ));
        }
    }

    let single = client.pod_status(pod).await?;
    if single.len() != 1 {
        return Err(assertion(
            NAME,
            format!(
                "pod '{pod}' status has {} entries, expected 1",
                single.len()
            ),
        ));
    }
    let observed = &single[0];
    let Some(listed) = statuses.get(pod).and_then(|tasks| tasks.first()) else {
        return Err(assertion(
            NAME,
            format!("pod '{pod}' missing from the all-pods status"),
        ));
    };
    if observed.id != listed.id || observed.name != listed.name || observed.state != listed.state {
        return Err(assertion(
            NAME,
            format!(
                "pod '{pod}' status disagrees across surfaces: \
                 '{}' ({}) vs '{}' ({})",
                observed.id, observed.state, listed.id, listed.state
            ),
        ));
    }

    info!(pods = statuses.len(), pod = %pod, "Pod statuses verified");
    Ok(ScenarioReport {
        name: NAME.to_string(),
        attempts: 1,
        elapsed: start.elapsed(),
        detail: format!("{} pods running", statuses.len()),
    })
}

/// Validate one pod's `pods info` entry: exactly one task whose
/// desired and observed IDs agree and which is running.
pub async fn verify_pod_info(
    client: &SchedulerClient,
    pod: &str,
) -> Result<ScenarioReport, HarnessError> {
    const NAME: &str = "pods_info";
    let start = Instant::now();

    let entries = client.pod_info(pod).await?;
    if entries.len() != 1 {
        return Err(assertion(
            NAME,
            format!("pod '{pod}' has {} info entries, expected 1", entries.len()),
        ));
    }
    let entry = &entries[0];

    if entry.info.name != format!("{pod}-server") {
        return Err(assertion(
            NAME,
            format!("info names task '{}', expected '{pod}-server'", entry.info.name),
        ));
    }
    if !entry.ids_agree() {
        return Err(assertion(
            NAME,
            format!(
                "desired task ID '{}' disagrees with observed '{}'",
                entry.info.task_id.value, entry.status.task_id.value
            ),
        ));
    }
    if entry.status.state != "TASK_RUNNING" {
        return Err(assertion(
            NAME,
            format!("pod '{pod}' is {}, expected TASK_RUNNING", entry.status.state),
        ));
    }

    Ok(ScenarioReport {
        name: NAME.to_string(),
        attempts: 1,
        elapsed: start.elapsed(),
        detail: format!("{pod} consistent on agent {}", entry.info.agent_id.value),
    })
}

/// A scale-to-two trigger for the lock-oracle scenario: removes the
/// single-instance guard label and raises the scheduler's own
/// instance count, inducing a second (competing) scheduler.
pub fn competing_scheduler_trigger(client: &SchedulerClient) -> Trigger {
    let client = client.clone();

    Box::new(move || {
        Box::pin(async move {
            let mut config = client.get_app_config().await?;

            if let Some(labels) = config.rest.get_mut("labels").and_then(|l| l.as_object_mut()) {
                labels.remove("SINGLE_INSTANCE_APP");
            }
            config.rest.insert("instances".to_string(), 2u32.into());

            client.put_app_config(&config).await?;
            Ok(())
        })
    })
}
