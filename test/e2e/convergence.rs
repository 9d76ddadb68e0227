//! End-to-end convergence scenarios against a mock scheduler.
//!
//! Each test drives the real scenario runner: baseline snapshot, one
//! trigger, identity-diff poll, invariant checks. The mock cluster
//! swaps its inventory when triggered, standing in for the external
//! scheduler's rollout.
//!
//! ## Running
//!
//! ```bash
//! cargo test -p podcheck-e2e --test convergence
//! ```

mod harness;

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use harness::{mock_cluster, swap_inventory_trigger, task, task_with_uuid, SERVICE};
use podcheck_harness::{
    run_scenario, scenarios, Expectation, FinalCount, HarnessError, PostChecks, ScenarioSpec,
};
use podcheck_invariants::InvariantViolation;

#[tokio::test]
async fn scale_out_adds_without_disturbing_baseline() {
    let survivor = Uuid::new_v4();
    let before = json!([task_with_uuid("proxylite", 0, "agent-1", survivor)]);
    let after = json!([
        task_with_uuid("proxylite", 0, "agent-1", survivor),
        task("proxylite", 1, "agent-2"),
    ]);

    let (_server, inventory, ctx) = mock_cluster(before).await;

    let spec = ScenarioSpec {
        name: "scale_out_proxylite".to_string(),
        prefix: "proxylite-".to_string(),
        expectation: Expectation::NoneReplaced,
        trigger: swap_inventory_trigger(&inventory, after),
        checks: PostChecks {
            final_count: FinalCount::BaselinePlus(1),
            ..PostChecks::default()
        },
    };

    let report = run_scenario(&ctx, spec).await.unwrap();
    assert_eq!(report.detail, "1 -> 2 tasks");

    // The baseline task is still there, unreplaced.
    let final_snapshot = ctx.collector.collect(Some("proxylite-")).await.unwrap();
    let ids = final_snapshot.task_ids();
    assert!(ids
        .iter()
        .any(|id| id.instance_uuid() == survivor.to_string()));
}

#[tokio::test]
async fn scale_out_fails_if_a_baseline_task_is_swapped() {
    let before = json!([
        task("proxylite", 0, "agent-1"),
        task("proxylite", 1, "agent-2"),
    ]);
    // proxylite-0 keeps nothing: both tasks get fresh UUIDs.
    let after = json!([
        task("proxylite", 0, "agent-1"),
        task("proxylite", 1, "agent-2"),
        task("proxylite", 2, "agent-3"),
    ]);

    let (_server, inventory, ctx) = mock_cluster(before).await;

    let spec = ScenarioSpec {
        name: "scale_out_proxylite".to_string(),
        prefix: "proxylite-".to_string(),
        expectation: Expectation::NoneReplaced,
        trigger: swap_inventory_trigger(&inventory, after),
        checks: PostChecks::default(),
    };

    let err = run_scenario(&ctx, spec).await.unwrap_err();
    assert!(matches!(err, HarnessError::Timeout { .. }));
}

/// Mount the restart/replace command endpoint: acknowledges the pod
/// and swaps the inventory as a side effect.
async fn mount_pod_command(
    server: &wiremock::MockServer,
    inventory: &harness::Inventory,
    pod: &str,
    command: &str,
    after: serde_json::Value,
) {
    let inventory = inventory.clone();
    let pod_name = pod.to_string();
    let response = move |_req: &wiremock::Request| {
        inventory.set(after.clone());
        ResponseTemplate::new(200).set_body_json(json!({
            "pod": pod_name,
            "tasks": [format!("{pod_name}-server")]
        }))
    };

    Mock::given(method("POST"))
        .and(path(format!(
            "/v1/service/{SERVICE}/pods/{pod}/{command}"
        )))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn restart_replaces_task_and_keeps_agent() {
    let before = json!([
        task("proxylite", 0, "agent-1"),
        task("world", 0, "agent-2"),
    ]);
    let after = json!([
        task("proxylite", 0, "agent-1"), // fresh uuid, same agent
        task("world", 0, "agent-2"),
    ]);

    let (server, inventory, ctx) = mock_cluster(before).await;
    mount_pod_command(&server, &inventory, "proxylite-0", "restart", after).await;

    let report = run_scenario(&ctx, scenarios::restart_pod(&ctx.client, "proxylite-0"))
        .await
        .unwrap();
    assert_eq!(report.detail, "1 -> 1 tasks");
}

#[tokio::test]
async fn restart_fails_if_task_moves_agents() {
    let before = json!([task("proxylite", 0, "agent-1")]);
    let after = json!([task("proxylite", 0, "agent-9")]);

    let (server, inventory, ctx) = mock_cluster(before).await;
    mount_pod_command(&server, &inventory, "proxylite-0", "restart", after).await;

    let err = run_scenario(&ctx, scenarios::restart_pod(&ctx.client, "proxylite-0"))
        .await
        .unwrap_err();
    match err {
        HarnessError::Assertion { message, .. } => {
            assert!(message.contains("agent-1"));
            assert!(message.contains("agent-9"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn replace_accepts_agent_move() {
    let before = json!([task("world", 0, "agent-2")]);
    let after = json!([task("world", 0, "agent-5")]);

    let (server, inventory, ctx) = mock_cluster(before).await;
    mount_pod_command(&server, &inventory, "world-0", "replace", after).await;

    let report = run_scenario(&ctx, scenarios::replace_pod(&ctx.client, "world-0"))
        .await
        .unwrap();
    assert_eq!(report.detail, "1 -> 1 tasks");
}

#[tokio::test]
async fn transient_inventory_failures_are_absorbed_mid_poll() {
    let survivor = Uuid::new_v4();
    let state = json!([task_with_uuid("proxylite", 0, "agent-1", survivor)]);

    let (_server, inventory, ctx) = mock_cluster(state).await;

    // The baseline read succeeds; the first two polls after the
    // trigger hit an unreachable inventory. The collector must report
    // "no data yet" and the engine must keep going until it recovers.
    let flaky = inventory.clone();
    let trigger: podcheck_harness::Trigger = Box::new(move || {
        Box::pin(async move {
            flaky.fail_next(2);
            Ok(())
        })
    });

    let spec = ScenarioSpec {
        name: "steady_state".to_string(),
        prefix: "proxylite-".to_string(),
        expectation: Expectation::NoneReplaced,
        trigger,
        checks: PostChecks {
            final_count: FinalCount::Baseline,
            ..PostChecks::default()
        },
    };

    let report = run_scenario(&ctx, spec).await.unwrap();
    // At least the two failed reads plus the converging one.
    assert!(report.attempts >= 3);
    assert_eq!(report.detail, "1 -> 1 tasks");
}

#[tokio::test]
async fn empty_baseline_from_transient_noise_converges_on_first_data() {
    // If the baseline snapshot happens to be empty (inventory down),
    // none_replaced holds trivially and the scenario converges as soon
    // as real data appears. The runner does not treat this as proof
    // that nothing happened; final-count checks are relative to the
    // (empty) baseline.
    let state = json!([task("proxylite", 0, "agent-1")]);
    let (server, _inventory, ctx) = mock_cluster(state).await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/service/{SERVICE}/tasks")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    let spec = ScenarioSpec {
        name: "cold_start".to_string(),
        prefix: "proxylite-".to_string(),
        expectation: Expectation::NoneReplaced,
        trigger: scenarios::noop_trigger(),
        checks: PostChecks {
            final_count: FinalCount::BaselinePlus(1),
            ..PostChecks::default()
        },
    };

    let report = run_scenario(&ctx, spec).await.unwrap();
    assert_eq!(report.detail, "0 -> 1 tasks");
}

#[tokio::test]
async fn pod_listing_checks_order_and_idempotence() {
    let state = json!([
        task("proxylite", 0, "agent-1"),
        task("proxylite", 1, "agent-2"),
        task("world", 0, "agent-3"),
    ]);
    let (server, _inventory, ctx) = mock_cluster(state).await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/service/{SERVICE}/pods")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            "proxylite-0", "proxylite-1", "world-0"
        ])))
        .mount(&server)
        .await;

    let counts = [("proxylite".to_string(), 2u32), ("world".to_string(), 1u32)]
        .into_iter()
        .collect();
    let report = run_scenario(&ctx, scenarios::pod_listing(counts))
        .await
        .unwrap();
    assert_eq!(report.name, "pods_list");
}

#[tokio::test]
async fn pod_listing_rejects_interleaved_order() {
    let state = json!([
        task("proxylite", 0, "agent-1"),
        task("proxylite", 1, "agent-2"),
        task("world", 0, "agent-3"),
    ]);
    let (server, _inventory, ctx) = mock_cluster(state).await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/service/{SERVICE}/pods")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            "proxylite-0", "world-0", "proxylite-1"
        ])))
        .mount(&server)
        .await;

    let counts = [("proxylite".to_string(), 2u32), ("world".to_string(), 1u32)]
        .into_iter()
        .collect();
    let err = run_scenario(&ctx, scenarios::pod_listing(counts))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Invariant(InvariantViolation::OutOfOrder { index: 1, .. })
    ));
}

#[tokio::test]
async fn colocated_tasks_fail_the_placement_check() {
    let state = json!([
        task("proxylite", 0, "agent-1"),
        task("proxylite", 1, "agent-1"), // same agent, same type
        task("world", 0, "agent-1"),
    ]);
    let (_server, _inventory, ctx) = mock_cluster(state).await;

    let err = run_scenario(&ctx, scenarios::placement(&["proxylite", "world"]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Invariant(InvariantViolation::Colocation { .. })
    ));
}
