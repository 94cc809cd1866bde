//! HTTP client for the remote request-status API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::models::Snapshot;

/// Source of the current snapshot of a student's supply requests.
#[async_trait]
pub trait RequestSource: Send + Sync {
    /// Fetch every request of `student_id` as currently known by the server.
    ///
    /// Any error (transport, timeout, non-2xx, undecodable body) means the
    /// snapshot could not be observed for this cycle.
    async fn fetch_snapshot(&self, student_id: &str) -> Result<Snapshot>;
}

/// [`RequestSource`] backed by the university REST API.
pub struct HttpRequestSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRequestSource {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the API (e.g., "https://universidad-la9h.onrender.com")
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: &str, timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn requests_url(&self) -> String {
        format!("{}/estudiantes/solicitudes", self.base_url)
    }
}

#[async_trait]
impl RequestSource for HttpRequestSource {
    async fn fetch_snapshot(&self, student_id: &str) -> Result<Snapshot> {
        let response = self
            .client
            .get(self.requests_url())
            .query(&[("id_estudiante", student_id)])
            .header("Content-Type", "application/json")
            .send()
            .await
            .context("Failed to reach request API")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Fetching requests for student {} failed with status {}",
                student_id,
                response.status()
            );
        }

        let values: Vec<Value> = response
            .json()
            .await
            .context("Failed to parse request list response")?;

        Ok(Snapshot::from_api_values(&values))
    }
}
