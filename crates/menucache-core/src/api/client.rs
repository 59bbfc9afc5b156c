//! HTTP client for the remote menu endpoint.
//!
//! The endpoint serves the whole menu as one JSON document. `MenuClient`
//! performs a single GET per call and never retries; retry policy belongs
//! to the sync coordinator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::debug;

use crate::config::Config;
use crate::models::{CatalogItem, MenuList};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for good UX.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("menucache/", env!("CARGO_PKG_VERSION"));

/// A source of complete menu snapshots.
#[async_trait]
pub trait MenuSource: Send + Sync {
    /// Where snapshots come from, for logging.
    fn endpoint(&self) -> &str;

    /// Fetch and decode one full snapshot. Never touches the local store.
    async fn fetch_snapshot(&self) -> Result<Vec<CatalogItem>, ApiError>;
}

/// Menu client backed by reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct MenuClient {
    client: Client,
    endpoint: String,
}

impl MenuClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            config.endpoint_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Decode a response body. The whole snapshot is rejected on the first bad record.
    pub fn decode(body: &str) -> Result<Vec<CatalogItem>, ApiError> {
        let list: MenuList = serde_json::from_str(body)?;
        Ok(list.into_items())
    }
}

#[async_trait]
impl MenuSource for MenuClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_snapshot(&self) -> Result<Vec<CatalogItem>, ApiError> {
        debug!(url = %self.endpoint, "Fetching menu snapshot");

        let response = self
            .client
            .get(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let body = response.text().await?;
        let items = Self::decode(&body)?;

        debug!(url = %self.endpoint, count = items.len(), "Menu snapshot decoded");
        Ok(items)
    }
}
