//! Where the baseline document comes from.

use kbdelta_core::Config;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Knowledge base unavailable at {location}: {reason}")]
    Unavailable { location: String, reason: String },

    #[error("Knowledge base at {location} is not valid JSON: {reason}")]
    Malformed { location: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    File(PathBuf),
    Http(String),
}

impl DocumentSource {
    pub fn from_config(config: &Config) -> Self {
        if config.document_is_remote() {
            DocumentSource::Http(config.document.clone())
        } else {
            DocumentSource::File(config.document_path())
        }
    }

    pub fn location(&self) -> String {
        match self {
            DocumentSource::File(path) => path.display().to_string(),
            DocumentSource::Http(url) => url.clone(),
        }
    }
}

/// Load and parse the baseline document.
pub async fn fetch_document(
    source: &DocumentSource,
    timeout: Duration,
) -> Result<Value, DocumentError> {
    let location = source.location();
    let unavailable = |reason: String| DocumentError::Unavailable {
        location: location.clone(),
        reason,
    };

    let text = match source {
        DocumentSource::File(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| unavailable(e.to_string()))?,
        DocumentSource::Http(url) => fetch_http(url, timeout).await.map_err(unavailable)?,
    };

    let document: Value = serde_json::from_str(&text).map_err(|e| DocumentError::Malformed {
        location: location.clone(),
        reason: e.to_string(),
    })?;
    tracing::debug!(%location, "Loaded knowledge base");
    Ok(document)
}

#[cfg(feature = "rest")]
async fn fetch_http(url: &str, timeout: Duration) -> Result<String, String> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| e.to_string())?;
    let response = client.get(url).send().await.map_err(|e| e.to_string())?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {}", status));
    }
    response.text().await.map_err(|e| e.to_string())
}

#[cfg(not(feature = "rest"))]
async fn fetch_http(_url: &str, _timeout: Duration) -> Result<String, String> {
    Err("HTTP documents require the `rest` feature".to_string())
}
