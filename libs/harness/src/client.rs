//! Scheduler API client.
//!
//! Wraps the external scheduler's observation surface (task
//! inventory, pod listing/status/info) and its triggering operations
//! (pod restart/replace, app config update). Observation failures are
//! classified transient vs fatal here; triggering calls are single
//! shots that the harness never retries.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use podcheck_model::{PodInfoEntry, PodStatusTask, RawTask};

use crate::config::HarnessConfig;
use crate::error::ClientError;

/// Client for the scheduler API.
#[derive(Debug, Clone)]
pub struct SchedulerClient {
    client: reqwest::Client,
    base_url: String,
    service: String,
}

/// Response to a pod restart/replace command: `{pod, tasks}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodCommandResponse {
    pub pod: String,
    pub tasks: Vec<String>,
}

/// The scheduler's app-level configuration document.
///
/// Only the `env` map is interpreted; every other field is carried
/// opaquely so a read-modify-write update round-trips unknown keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Environment-variable style config parameters
    /// (`PROXYLITE_COUNT`, `PROXYLITE_CPUS`, ...).
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Status-only field, read for the lock-oracle failure signal and
    /// never written back.
    #[serde(default, rename = "lastTaskFailure", skip_serializing)]
    pub last_task_failure: Option<LastTaskFailure>,

    /// Everything else, round-tripped untouched.
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

/// The scheduler's record of the most recent task failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastTaskFailure {
    pub timestamp: String,
}

impl SchedulerClient {
    /// Create a new client for the configured scheduler and service.
    pub fn new(config: &HarnessConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.scheduler_url.trim_end_matches('/').to_string(),
            service: config.service.clone(),
        }
    }

    /// The service this client is scoped to.
    pub fn service(&self) -> &str {
        &self.service
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        Self::decode(path, response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        Self::decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status, body));
        }

        let body = response
            .text()
            .await
            .map_err(ClientError::from_transport)?;

        serde_json::from_str(&body).map_err(|e| ClientError::Schema {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Fetch all task descriptors for the service.
    pub async fn list_tasks(&self) -> Result<Vec<RawTask>, ClientError> {
        self.get_json(&format!("/v1/service/{}/tasks", self.service))
            .await
    }

    /// Fetch the ordered pod listing (`pods list`).
    pub async fn list_pods(&self) -> Result<Vec<String>, ClientError> {
        self.get_json(&format!("/v1/service/{}/pods", self.service))
            .await
    }

    /// Fetch status for every pod (`pods status`).
    pub async fn pod_statuses(
        &self,
    ) -> Result<BTreeMap<String, Vec<PodStatusTask>>, ClientError> {
        self.get_json(&format!("/v1/service/{}/pods/status", self.service))
            .await
    }

    /// Fetch status for one pod (`pods status {pod}`).
    pub async fn pod_status(&self, pod: &str) -> Result<Vec<PodStatusTask>, ClientError> {
        self.get_json(&format!("/v1/service/{}/pods/{}/status", self.service, pod))
            .await
    }

    /// Fetch desired-vs-observed info for one pod (`pods info {pod}`).
    pub async fn pod_info(&self, pod: &str) -> Result<Vec<PodInfoEntry>, ClientError> {
        self.get_json(&format!("/v1/service/{}/pods/{}/info", self.service, pod))
            .await
    }

    /// Restart a pod in place. Single shot, not retried.
    pub async fn restart_pod(&self, pod: &str) -> Result<PodCommandResponse, ClientError> {
        self.post_json(&format!(
            "/v1/service/{}/pods/{}/restart",
            self.service, pod
        ))
        .await
    }

    /// Replace a pod (tear down and reschedule). Single shot.
    pub async fn replace_pod(&self, pod: &str) -> Result<PodCommandResponse, ClientError> {
        self.post_json(&format!(
            "/v1/service/{}/pods/{}/replace",
            self.service, pod
        ))
        .await
    }

    /// Fetch the app-level configuration document.
    pub async fn get_app_config(&self) -> Result<AppConfig, ClientError> {
        self.get_json(&format!("/v1/apps/{}", self.service)).await
    }

    /// Write back an updated configuration document. Single shot.
    pub async fn put_app_config(&self, config: &AppConfig) -> Result<(), ClientError> {
        let path = format!("/v1/apps/{}", self.service);
        let url = self.url(&path);
        debug!(url = %url, "PUT");

        let response = self
            .client
            .put(&url)
            .json(config)
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status, body));
        }

        Ok(())
    }

    /// The timestamp of the most recent task failure, if any.
    ///
    /// Used as the lock-oracle failure signal: a change from the
    /// baseline value means a competing scheduler instance crashed.
    pub async fn last_failure_timestamp(&self) -> Result<Option<String>, ClientError> {
        let config = self.get_app_config().await?;
        Ok(config.last_task_failure.map(|f| f.timestamp))
    }
}
