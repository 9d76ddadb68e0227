//! End-to-end lock-oracle scenario against a mock scheduler and store.
//!
//! The oracle induces a competing scheduler instance, waits for the
//! loser to crash (surfaced as a new `lastTaskFailure` timestamp), and
//! asserts the config-store target blob came through untouched.
//!
//! ## Running
//!
//! ```bash
//! cargo test -p podcheck-e2e --test lock_oracle
//! ```

mod harness;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use harness::{mock_cluster, task, SERVICE};
use podcheck_harness::{
    run_lock_oracle, scenarios, ConfigStoreClient, HarnessConfig, HarnessError, Trigger,
};

const STORE_PATH: &str = "dcos-service-proxylite/ConfigTarget";

fn app_config_without_failure() -> Value {
    json!({
        "id": "/proxylite",
        "instances": 1,
        "labels": { "SINGLE_INSTANCE_APP": "true" },
        "env": { "PROXYLITE_COUNT": "2", "PROXYLITE_CPUS": "0.1" }
    })
}

fn with_failure(mut config: Value, timestamp: &str) -> Value {
    config["lastTaskFailure"] = json!({ "timestamp": timestamp });
    config
}

/// Mount `GET /v1/apps/proxylite` backed by shared mutable state.
async fn mount_app_config(server: &MockServer, state: &Arc<Mutex<Value>>) {
    let state = state.clone();
    Mock::given(method("GET"))
        .and(path(format!("/v1/apps/{SERVICE}")))
        .respond_with(move |_: &Request| {
            ResponseTemplate::new(200).set_body_json(state.lock().unwrap().clone())
        })
        .mount(server)
        .await;
}

/// Mount `GET /v1/store/{STORE_PATH}` backed by shared mutable bytes.
async fn mount_store_blob(server: &MockServer, blob: &Arc<Mutex<Vec<u8>>>) {
    let blob = blob.clone();
    Mock::given(method("GET"))
        .and(path(format!("/v1/store/{STORE_PATH}")))
        .respond_with(move |_: &Request| {
            ResponseTemplate::new(200).set_body_bytes(blob.lock().unwrap().clone())
        })
        .mount(server)
        .await;
}

fn store_client(server: &MockServer) -> ConfigStoreClient {
    let config = HarnessConfig {
        store_url: server.uri(),
        ..HarnessConfig::default()
    };
    ConfigStoreClient::new(&config)
}

#[tokio::test]
async fn oracle_passes_when_blob_survives_the_competition() {
    let (server, _inventory, ctx) = mock_cluster(json!([task("proxylite", 0, "agent-1")])).await;

    let app_state = Arc::new(Mutex::new(app_config_without_failure()));
    let blob = Arc::new(Mutex::new(b"target-v1".to_vec()));
    mount_app_config(&server, &app_state).await;
    mount_store_blob(&server, &blob).await;

    // Accepting the scale-up is what crashes the losing instance: the
    // PUT's side effect is the new failure timestamp.
    let put_state = app_state.clone();
    Mock::given(method("PUT"))
        .and(path(format!("/v1/apps/{SERVICE}")))
        .respond_with(move |_: &Request| {
            let mut state = put_state.lock().unwrap();
            *state = with_failure(state.clone(), "1467253092.12");
            ResponseTemplate::new(200)
        })
        .expect(1)
        .mount(&server)
        .await;

    let store = store_client(&server);
    let trigger = scenarios::competing_scheduler_trigger(&ctx.client);

    let report = run_lock_oracle(&ctx, &store, STORE_PATH, trigger)
        .await
        .unwrap();
    assert_eq!(report.name, "lock_oracle");
    assert!(report.detail.contains("blob stable"));

    // The scale-up request dropped the single-instance guard and asked
    // for two scheduler instances.
    let requests = server.received_requests().await.unwrap();
    let put = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .unwrap();
    let body: Value = serde_json::from_slice(&put.body).unwrap();
    assert_eq!(body["instances"], json!(2));
    assert!(body["labels"].get("SINGLE_INSTANCE_APP").is_none());
}

#[tokio::test]
async fn oracle_flags_a_mutated_store_blob() {
    let (server, _inventory, ctx) = mock_cluster(json!([task("proxylite", 0, "agent-1")])).await;

    let app_state = Arc::new(Mutex::new(app_config_without_failure()));
    let blob = Arc::new(Mutex::new(b"target-v1".to_vec()));
    mount_app_config(&server, &app_state).await;
    mount_store_blob(&server, &blob).await;

    // The competing instance both crashes and manages to rewrite the
    // target before dying. The oracle must catch the rewrite.
    let trigger_state = app_state.clone();
    let trigger_blob = blob.clone();
    let trigger: Trigger = Box::new(move || {
        Box::pin(async move {
            let mut state = trigger_state.lock().unwrap();
            *state = with_failure(state.clone(), "1467253092.12");
            *trigger_blob.lock().unwrap() = b"target-v2".to_vec();
            Ok(())
        })
    });

    let store = store_client(&server);
    let err = run_lock_oracle(&ctx, &store, STORE_PATH, trigger)
        .await
        .unwrap_err();
    match err {
        HarnessError::StoreMutated {
            path,
            before_digest,
            after_digest,
        } => {
            assert_eq!(path, STORE_PATH);
            assert_ne!(before_digest, after_digest);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn oracle_times_out_without_a_failure_signal() {
    let (server, _inventory, ctx) = mock_cluster(json!([task("proxylite", 0, "agent-1")])).await;

    // A pre-existing failure that never advances must not satisfy the
    // signal check.
    let app_state = Arc::new(Mutex::new(with_failure(
        app_config_without_failure(),
        "1467253000.00",
    )));
    let blob = Arc::new(Mutex::new(b"target-v1".to_vec()));
    mount_app_config(&server, &app_state).await;
    mount_store_blob(&server, &blob).await;

    let store = store_client(&server);
    let err = run_lock_oracle(&ctx, &store, STORE_PATH, scenarios::noop_trigger())
        .await
        .unwrap_err();
    match err {
        HarnessError::Timeout {
            scenario, baseline, ..
        } => {
            assert_eq!(scenario, "lock_oracle");
            assert!(baseline.contains("1467253000.00"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn oracle_aborts_on_a_rejected_signal_read() {
    let (server, _inventory, ctx) = mock_cluster(json!([task("proxylite", 0, "agent-1")])).await;

    let blob = Arc::new(Mutex::new(b"target-v1".to_vec()));
    mount_store_blob(&server, &blob).await;

    // The baseline read succeeds; every later read is rejected. A 404
    // is not noise the poll may wait out, it must surface at once.
    Mock::given(method("GET"))
        .and(path(format!("/v1/apps/{SERVICE}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(app_config_without_failure()),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/apps/{SERVICE}")))
        .respond_with(ResponseTemplate::new(404).set_body_string("app gone"))
        .mount(&server)
        .await;

    let store = store_client(&server);
    let start = std::time::Instant::now();
    let err = run_lock_oracle(&ctx, &store, STORE_PATH, scenarios::noop_trigger())
        .await
        .unwrap_err();

    match err {
        HarnessError::External(client_err) => assert!(!client_err.is_transient()),
        other => panic!("unexpected error: {other}"),
    }
    // Aborted on the first poll attempt, well inside the deadline.
    assert!(start.elapsed() < std::time::Duration::from_millis(400));
}

#[tokio::test]
async fn oracle_ignores_transient_signal_read_failures() {
    let (server, _inventory, ctx) = mock_cluster(json!([task("proxylite", 0, "agent-1")])).await;

    let blob = Arc::new(Mutex::new(b"target-v1".to_vec()));
    mount_store_blob(&server, &blob).await;

    // The first two polls after the trigger hit a flaky scheduler; the
    // signal check treats them as "no change yet". The baseline read
    // happens before the trigger arms the budget and stays clean.
    let app_state = Arc::new(Mutex::new(app_config_without_failure()));
    let fail_budget = Arc::new(AtomicU32::new(0));
    let respond_state = app_state.clone();
    let respond_budget = fail_budget.clone();
    Mock::given(method("GET"))
        .and(path(format!("/v1/apps/{SERVICE}")))
        .respond_with(move |_: &Request| {
            let flaky = respond_budget
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if flaky {
                return ResponseTemplate::new(503);
            }
            ResponseTemplate::new(200).set_body_json(respond_state.lock().unwrap().clone())
        })
        .mount(&server)
        .await;

    let trigger_state = app_state.clone();
    let trigger_budget = fail_budget.clone();
    let trigger: Trigger = Box::new(move || {
        Box::pin(async move {
            let mut state = trigger_state.lock().unwrap();
            *state = with_failure(state.clone(), "1467253092.12");
            trigger_budget.store(2, Ordering::SeqCst);
            Ok(())
        })
    });

    let store = store_client(&server);
    let report = run_lock_oracle(&ctx, &store, STORE_PATH, trigger)
        .await
        .unwrap();
    assert!(report.attempts >= 3);
}
