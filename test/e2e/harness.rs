//! Shared mock cluster for the e2e suite.
//!
//! Stands in for the external scheduler: a wiremock server whose task
//! inventory is backed by shared mutable state, so a scenario's
//! trigger can swap the observed world mid-poll exactly the way a
//! real rollout would.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use podcheck_converge::PollConfig;
use podcheck_harness::{HarnessConfig, ScenarioContext, Trigger};

pub const SERVICE: &str = "proxylite";

/// One mock task descriptor.
#[allow(dead_code)]
pub fn task(pod_type: &str, ordinal: u32, agent: &str) -> Value {
    task_with_uuid(pod_type, ordinal, agent, Uuid::new_v4())
}

#[allow(dead_code)]
pub fn task_with_uuid(pod_type: &str, ordinal: u32, agent: &str, uuid: Uuid) -> Value {
    json!({
        "id": format!("{pod_type}-{ordinal}-server__{uuid}"),
        "name": format!("{pod_type}-{ordinal}-server"),
        "agent_id": agent,
        "state": "TASK_RUNNING"
    })
}

/// Shared, swappable inventory state.
#[derive(Clone)]
pub struct Inventory {
    tasks: Arc<Mutex<Value>>,
    fail_budget: Arc<AtomicU32>,
}

impl Inventory {
    pub fn new(tasks: Value) -> Self {
        Self {
            tasks: Arc::new(Mutex::new(tasks)),
            fail_budget: Arc::new(AtomicU32::new(0)),
        }
    }

    #[allow(dead_code)]
    pub fn set(&self, tasks: Value) {
        *self.tasks.lock().unwrap() = tasks;
    }

    /// Make the next `n` inventory reads answer 503 before recovering.
    #[allow(dead_code)]
    pub fn fail_next(&self, n: u32) {
        self.fail_budget.store(n, Ordering::SeqCst);
    }

    fn current(&self) -> Value {
        self.tasks.lock().unwrap().clone()
    }

    fn take_failure(&self) -> bool {
        self.fail_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

struct ServeInventory(Inventory);

impl Respond for ServeInventory {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        if self.0.take_failure() {
            return ResponseTemplate::new(503);
        }
        ResponseTemplate::new(200).set_body_json(self.0.current())
    }
}

/// Start a mock scheduler serving `initial` as its inventory, and a
/// scenario context with a test-friendly poll window.
pub async fn mock_cluster(initial: Value) -> (MockServer, Inventory, ScenarioContext) {
    let server = MockServer::start().await;
    let inventory = Inventory::new(initial);

    Mock::given(method("GET"))
        .and(path(format!("/v1/service/{SERVICE}/tasks")))
        .respond_with(ServeInventory(inventory.clone()))
        .mount(&server)
        .await;

    let config = HarnessConfig {
        service: SERVICE.to_string(),
        scheduler_url: server.uri(),
        store_url: server.uri(),
        poll: PollConfig::new(Duration::from_millis(500), Duration::from_millis(10)),
    };
    let ctx = ScenarioContext::new(&config);

    (server, inventory, ctx)
}

/// A trigger that swaps the mock inventory to `after`, simulating the
/// cluster reacting to an external operation.
#[allow(dead_code)]
pub fn swap_inventory_trigger(inventory: &Inventory, after: Value) -> Trigger {
    let inventory = inventory.clone();
    Box::new(move || {
        Box::pin(async move {
            inventory.set(after);
            Ok(())
        })
    })
}
