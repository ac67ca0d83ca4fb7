//! Change store backed by a realtime-database style REST node.
//!
//! The node lives at `{base}/{node}.json`. `PUT` overwrites it, `GET`
//! returns `null` when it is empty, and `DELETE` clears it.

use async_trait::async_trait;
use kbdelta_core::{ChangeStore, StoreError};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RestStore {
    endpoint: String,
    auth: Option<String>,
    client: reqwest::Client,
}

impl RestStore {
    pub fn new(
        base_url: &str,
        node: &str,
        auth: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: node_url(base_url, node),
            auth,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, &self.endpoint);
        match &self.auth {
            Some(token) => builder.query(&[("auth", token)]),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(format!(
                "{} returned {}: {}",
                self.endpoint, status, body
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl ChangeStore for RestStore {
    async fn save(&self, blob: &Value) -> Result<(), StoreError> {
        self.send(self.request(reqwest::Method::PUT).json(blob))
            .await?;
        tracing::debug!(endpoint = %self.endpoint, "PUT change blob");
        Ok(())
    }

    async fn load(&self) -> Result<Option<Value>, StoreError> {
        let response = self.send(self.request(reqwest::Method::GET)).await?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Backend(format!("Invalid JSON from {}: {}", self.endpoint, e)))?;
        tracing::debug!(endpoint = %self.endpoint, empty = value.is_null(), "GET change blob");
        Ok((!value.is_null()).then_some(value))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.send(self.request(reqwest::Method::DELETE)).await?;
        tracing::debug!(endpoint = %self.endpoint, "DELETE change blob");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("rest:{}", self.endpoint)
    }
}

fn node_url(base_url: &str, node: &str) -> String {
    let node = node.trim_matches('/');
    let node = node.strip_suffix(".json").unwrap_or(node);
    format!("{}/{}.json", base_url.trim_end_matches('/'), node)
}
