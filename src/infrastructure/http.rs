use super::demo::demo_queue;
use crate::types::{
    DEFAULT_HTTP_TIMEOUT, QueueItem, QueueStatistics, QueueUpdate, RealtimeError, Result,
    ServiceInfo,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Entries generated per department when the REST backend is unreachable
const DEMO_QUEUE_LEN: usize = 8;

/// REST data-access client used to seed views before (or without) the realtime feed
pub struct QueueApi {
    base_url: String,
    http: reqwest::Client,
}

impl QueueApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(DEFAULT_HTTP_TIMEOUT))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        url::Url::parse(&base_url)?;
        Ok(Self { base_url, http })
    }

    /// Builds the REST client from the socket base address
    pub fn from_ws_endpoint(ws_endpoint: &str) -> Result<Self> {
        Self::new(ws_to_http_endpoint(ws_endpoint))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(RealtimeError::Api {
                status: response.status().as_u16(),
                url,
            });
        }

        let body = response.json::<T>().await?;
        tracing::debug!("Fetched {}", url);
        Ok(body)
    }

    /// Lists the services patients can register for
    pub async fn fetch_services(&self) -> Result<Vec<ServiceInfo>> {
        self.get_json("services").await
    }

    /// Current queue entries of one department
    pub async fn fetch_queue(&self, department_id: i64) -> Result<Vec<QueueItem>> {
        self.get_json(&format!("queue/{}", department_id)).await
    }

    pub async fn fetch_statistics(&self) -> Result<QueueStatistics> {
        self.get_json("stats").await
    }

    /// Fetches a department queue, falling back to demo data on any failure
    pub async fn fetch_queue_or_demo(&self, department_id: i64) -> QueueUpdate {
        match self.fetch_queue(department_id).await {
            Ok(queue) => QueueUpdate::new(department_id, queue),
            Err(e) => {
                tracing::warn!(
                    "Queue fetch for department {} failed, using demo data: {}",
                    department_id,
                    e
                );
                demo_queue(department_id, DEMO_QUEUE_LEN)
            }
        }
    }
}

/// Converts a WebSocket base address to the matching HTTP base address
pub fn ws_to_http_endpoint(ws_endpoint: &str) -> String {
    let without_query = ws_endpoint.split('?').next().unwrap_or(ws_endpoint);
    if let Some(rest) = without_query.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else if let Some(rest) = without_query.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else {
        without_query.to_string()
    }
}
