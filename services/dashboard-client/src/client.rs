//! Dashboard API Client
//!
//! One request, one response: status and content type are checked on every
//! exchange before the body is parsed. Nothing here retries.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::TransportError;

/// Transport seam between the dashboard components and the backend
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// GET `path` (relative to the backend root, query string included)
    async fn get_json(&self, path: &str) -> Result<Value, TransportError>;

    /// POST a JSON body to `path`
    async fn post_json(&self, path: &str, body: Value) -> Result<Value, TransportError>;
}

/// Client for the dashboard backend REST API
pub struct DashboardClient {
    client: Client,
    base_url: String,
}

impl DashboardClient {
    /// Create new dashboard client
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Perform one exchange and validate it
    async fn fetch_json(&self, request: RequestBuilder) -> Result<Value, TransportError> {
        let response = request.send().await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::status(status.as_u16(), &text));
        }
        if !content_type.contains("application/json") {
            return Err(TransportError::not_json(&content_type, &text));
        }

        serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DashboardApi for DashboardClient {
    async fn get_json(&self, path: &str) -> Result<Value, TransportError> {
        let url = self.url(path);
        debug!("GET {}", url);
        self.fetch_json(self.client.get(&url)).await
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value, TransportError> {
        let url = self.url(path);
        debug!("POST {}", url);
        self.fetch_json(self.client.post(&url).json(&body)).await
    }
}
