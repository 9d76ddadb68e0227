//! Scenario execution.
//!
//! A scenario is: baseline snapshot, one triggering operation, a
//! convergence poll with an identity-diff expectation, then invariant
//! checks on the final state. The runner owns no policy about which
//! operations cause replacement; each scenario declares its own
//! expectation.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use tracing::info;

use podcheck_converge::{
    all_replaced_verdict, none_replaced_verdict, poll_until, ConvergeError, PollConfig, Verdict,
};
use podcheck_invariants::{check_no_colocation, check_pod_list_order};
use podcheck_model::{Snapshot, TaskId};

use crate::client::SchedulerClient;
use crate::collector::SnapshotCollector;
use crate::config::HarnessConfig;
use crate::error::{ClientError, HarnessError};
use crate::store::{digest, ConfigStoreClient};

/// The single side-effecting call a scenario issues. Opaque to the
/// runner; never retried.
pub type Trigger =
    Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> + Send>;

/// Which identity-diff predicate the scenario expects to hold.
///
/// Whether a given operation forces replacement is external scheduler
/// policy; it is supplied per scenario, never inferred by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// Every baseline task is torn down and replaced (restart,
    /// replace, replacement-forcing config updates).
    AllReplaced,

    /// Every baseline task survives; only additions allowed
    /// (scale-out, non-disruptive config updates).
    NoneReplaced,
}

impl Expectation {
    fn verdict(self, old: &std::collections::BTreeSet<TaskId>, new: &Snapshot) -> Verdict {
        let new_ids = new.task_ids();
        match self {
            Expectation::AllReplaced => all_replaced_verdict(old, &new_ids),
            Expectation::NoneReplaced => none_replaced_verdict(old, &new_ids),
        }
    }
}

/// Expected size of the converged task set relative to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinalCount {
    /// No expectation beyond the predicate's own non-shrink guarantee.
    #[default]
    Any,

    /// Exactly the baseline count (restart, replace, config bump).
    Baseline,

    /// Baseline plus `n` (scale-out).
    BaselinePlus(u32),
}

/// Assertions run against the converged state.
#[derive(Debug, Clone, Default)]
pub struct PostChecks {
    /// Expected final task count relative to the baseline.
    pub final_count: FinalCount,

    /// Pod whose task must stay on its baseline agent (restart).
    pub agent_pinned: Option<String>,

    /// Pod types to re-check for anti-colocation on the full
    /// (unfiltered) final snapshot. Empty disables the check.
    pub colocation_pod_types: Vec<String>,

    /// Expected pod counts for a `pods list` ordering check against
    /// the live listing. `None` disables the check.
    pub pod_list_counts: Option<BTreeMap<String, u32>>,
}

/// One end-to-end convergence check.
pub struct ScenarioSpec {
    /// Scenario name, used in logs and failure reports.
    pub name: String,

    /// Task-name prefix under observation (e.g. `proxylite-` for a
    /// pod type, `world-0-` for a single pod).
    pub prefix: String,

    /// Identity-diff predicate expected to hold after the trigger.
    pub expectation: Expectation,

    /// The one external operation to issue.
    pub trigger: Trigger,

    /// Post-convergence assertions.
    pub checks: PostChecks,
}

/// Shared clients and poll settings for a run of scenarios.
#[derive(Debug, Clone)]
pub struct ScenarioContext {
    pub collector: SnapshotCollector,
    pub client: SchedulerClient,
    pub poll: PollConfig,
}

impl ScenarioContext {
    /// Build a context from harness configuration.
    pub fn new(config: &HarnessConfig) -> Self {
        let client = SchedulerClient::new(config);
        Self {
            collector: SnapshotCollector::new(client.clone()),
            client,
            poll: config.poll,
        }
    }
}

/// Outcome of a passed scenario.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub name: String,
    pub attempts: u32,
    pub elapsed: Duration,
    pub detail: String,
}

fn render_ids(ids: &std::collections::BTreeSet<TaskId>) -> String {
    let mut out = String::new();
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{id}");
    }
    out
}

/// Run one scenario to completion.
pub async fn run_scenario(
    ctx: &ScenarioContext,
    spec: ScenarioSpec,
) -> Result<ScenarioReport, HarnessError> {
    let ScenarioSpec {
        name,
        prefix,
        expectation,
        trigger,
        checks,
    } = spec;

    let baseline = ctx.collector.collect(Some(&prefix)).await?;
    let baseline_ids = baseline.task_ids();
    info!(
        scenario = %name,
        prefix = %prefix,
        baseline_tasks = baseline_ids.len(),
        taken_at = %baseline.taken_at(),
        "Captured baseline snapshot"
    );

    let pinned_agent = match &checks.agent_pinned {
        Some(pod) => Some(
            baseline
                .agent_of(pod)
                .ok_or_else(|| HarnessError::Assertion {
                    scenario: name.clone(),
                    message: format!("pod '{pod}' not present in baseline snapshot"),
                })?
                .to_string(),
        ),
        None => None,
    };

    trigger().await.map_err(HarnessError::Trigger)?;
    info!(scenario = %name, "Triggering operation issued, polling for convergence");

    let attempts = Cell::new(0u32);
    let start = Instant::now();

    let observe = || {
        attempts.set(attempts.get() + 1);
        let prefix = prefix.clone();
        async move { ctx.collector.collect(Some(&prefix)).await }
    };
    // A fatal collector error must abort the poll immediately, so it
    // also "satisfies" the check; genuine convergence is separated
    // from it right below.
    let check = |observed: &Result<Snapshot, HarnessError>| match observed {
        Ok(snapshot) => expectation.verdict(&baseline_ids, snapshot),
        Err(_) => Verdict::pass(),
    };

    let final_snapshot = match poll_until(observe, check, &ctx.poll).await {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(fatal)) => return Err(fatal),
        Err(ConvergeError::Timeout {
            elapsed,
            attempts,
            last_message,
            last,
        }) => {
            let observed = match &last {
                Ok(snapshot) => render_ids(&snapshot.task_ids()),
                Err(err) => err.to_string(),
            };
            return Err(HarnessError::Timeout {
                scenario: name,
                attempts,
                elapsed,
                last_message,
                baseline: render_ids(&baseline_ids),
                observed,
            });
        }
    };

    let elapsed = start.elapsed();
    let final_ids = final_snapshot.task_ids();
    info!(
        scenario = %name,
        attempts = attempts.get(),
        elapsed_ms = elapsed.as_millis() as u64,
        final_tasks = final_ids.len(),
        "Converged"
    );

    let expected_count = match checks.final_count {
        FinalCount::Any => None,
        FinalCount::Baseline => Some(baseline_ids.len()),
        FinalCount::BaselinePlus(n) => Some(baseline_ids.len() + n as usize),
    };
    if let Some(expected) = expected_count {
        if final_ids.len() != expected {
            return Err(HarnessError::Assertion {
                scenario: name,
                message: format!(
                    "expected {expected} tasks after convergence, observed {} ([{}])",
                    final_ids.len(),
                    render_ids(&final_ids)
                ),
            });
        }
    }

    if let (Some(pod), Some(expected_agent)) = (&checks.agent_pinned, &pinned_agent) {
        let actual = final_snapshot.agent_of(pod);
        if actual != Some(expected_agent.as_str()) {
            return Err(HarnessError::Assertion {
                scenario: name,
                message: format!(
                    "pod '{pod}' moved from agent '{expected_agent}' to {:?}",
                    actual
                ),
            });
        }
    }

    if !checks.colocation_pod_types.is_empty() {
        let full = ctx.collector.collect(None).await?;
        let pod_types: Vec<&str> = checks
            .colocation_pod_types
            .iter()
            .map(String::as_str)
            .collect();
        check_no_colocation(&full, &pod_types)?;
    }

    if let Some(counts) = &checks.pod_list_counts {
        let listing = ctx.client.list_pods().await.map_err(HarnessError::from)?;
        let listing_again = ctx.client.list_pods().await.map_err(HarnessError::from)?;
        if listing != listing_again {
            return Err(HarnessError::Assertion {
                scenario: name,
                message: format!(
                    "pod listing not stable across consecutive reads: {listing:?} vs {listing_again:?}"
                ),
            });
        }
        check_pod_list_order(&listing, counts)?;
    }

    Ok(ScenarioReport {
        name,
        attempts: attempts.get(),
        elapsed,
        detail: format!("{} -> {} tasks", baseline_ids.len(), final_ids.len()),
    })
}

/// Run the lock-oracle scenario: assert that a competing scheduler
/// instance failed without touching the config-store target blob.
///
/// The blob is read before the competing writer is induced, the poll
/// waits for the external failure signal (the scheduler's last-task-
/// failure timestamp moving past its baseline), and the blob is read
/// again and compared byte for byte.
pub async fn run_lock_oracle(
    ctx: &ScenarioContext,
    store: &ConfigStoreClient,
    store_path: &str,
    trigger: Trigger,
) -> Result<ScenarioReport, HarnessError> {
    let name = "lock_oracle".to_string();

    let before = store.read_blob(store_path).await?;
    let baseline_ts = ctx.client.last_failure_timestamp().await?;
    info!(
        scenario = %name,
        store_path = %store_path,
        blob_digest = %digest(&before),
        baseline_failure_ts = ?baseline_ts,
        "Captured store blob and failure baseline"
    );

    trigger().await.map_err(HarnessError::Trigger)?;

    let attempts = Cell::new(0u32);
    let start = Instant::now();

    // Transient signal-read failures look like "no change yet" and are
    // retried; a fatal one aborts the poll the same way it does in
    // run_scenario, by satisfying the check and being separated below.
    let observe = || {
        attempts.set(attempts.get() + 1);
        async move { ctx.client.last_failure_timestamp().await }
    };
    let check = |observed: &Result<Option<String>, ClientError>| match observed {
        Ok(ts) if ts.is_some() && *ts != baseline_ts => Verdict::pass(),
        Ok(ts) => Verdict::fail(format!(
            "competing scheduler has not failed yet (last failure: {ts:?})"
        )),
        Err(err) if err.is_transient() => {
            Verdict::fail(format!("failure signal unreadable: {err}"))
        }
        Err(_) => Verdict::pass(),
    };

    match poll_until(observe, check, &ctx.poll).await {
        Ok(Ok(_)) => {}
        Ok(Err(fatal)) => return Err(fatal.into()),
        Err(ConvergeError::Timeout {
            elapsed,
            attempts,
            last_message,
            last,
        }) => {
            return Err(HarnessError::Timeout {
                scenario: name,
                attempts,
                elapsed,
                last_message,
                baseline: format!("{baseline_ts:?}"),
                observed: format!("{last:?}"),
            });
        }
    }

    let after = store.read_blob(store_path).await?;
    if before != after {
        return Err(HarnessError::StoreMutated {
            path: store_path.to_string(),
            before_digest: digest(&before),
            after_digest: digest(&after),
        });
    }

    Ok(ScenarioReport {
        name,
        attempts: attempts.get(),
        elapsed: start.elapsed(),
        detail: format!("blob stable ({})", digest(&before)),
    })
}
