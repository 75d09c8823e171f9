//! Pinecone control plane
//!
//! Creates the serverless index on first use and resolves its data-plane host.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::core::config::PineconeConfig;
use crate::core::{Config, ConnectError, Result};

const API_VERSION: &str = "2024-07";

/// Shape of a newly created index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: String,
    pub cloud: String,
    pub region: String,
}

impl IndexSpec {
    pub fn from_config(pinecone: &PineconeConfig) -> Self {
        Self {
            name: pinecone.index_name.clone(),
            dimension: pinecone.dimension,
            metric: pinecone.metric.clone(),
            cloud: pinecone.cloud.clone(),
            region: pinecone.region.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    #[serde(default)]
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: String,
}

/// Client for `https://api.pinecone.io/indexes`
pub struct PineconeControl {
    client: Client,
    base_url: String,
    api_key: String,
    poll_interval: Duration,
    max_polls: u64,
}

impl PineconeControl {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            poll_interval: Duration::from_secs(1),
            max_polls: 300,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .pinecone
            .api_key
            .clone()
            .ok_or(ConnectError::MissingApiKey("PINECONE_API_KEY"))?;
        let poll_ms = config.pinecone.ready_poll_ms.max(1);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.openai.timeout_secs))
            .build()
            .map_err(|e| ConnectError::with_context("Failed to create HTTP client", e))?;

        let control = Self {
            client,
            base_url: config.pinecone.control_url.trim_end_matches('/').to_string(),
            api_key,
            poll_interval: Duration::from_secs(1),
            max_polls: 300,
        };
        Ok(control.with_polling(
            Duration::from_millis(poll_ms),
            config.pinecone.ready_timeout_secs * 1_000 / poll_ms,
        ))
    }

    /// Override how often and how long readiness is polled
    pub fn with_polling(mut self, interval: Duration, max_polls: u64) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls.max(1);
        self
    }

    /// Make sure the index exists and is ready; returns its data-plane host
    pub async fn ensure_index(&self, spec: &IndexSpec) -> Result<String> {
        if self.describe(&spec.name).await?.is_none() {
            self.create(spec).await?;
        }

        for poll in 0..self.max_polls {
            match self.describe(&spec.name).await? {
                Some(index) if index.status.ready => {
                    tracing::info!(index = %spec.name, host = %index.host, "Index ready");
                    return Ok(normalize_host(&index.host));
                }
                Some(index) => {
                    tracing::debug!(index = %spec.name, state = %index.status.state, poll, "Waiting for index");
                }
                None => {
                    tracing::debug!(index = %spec.name, poll, "Index not visible yet");
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        Err(ConnectError::retrieval(format!(
            "Index {} did not become ready",
            spec.name
        )))
    }

    async fn describe(&self, name: &str) -> Result<Option<IndexDescription>> {
        let response = self
            .client
            .get(format!("{}/indexes/{}", self.base_url, name))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ConnectError::retrieval(format!(
                "Describe index {} failed ({}): {}",
                name, status, error_text
            )));
        }

        let description = response
            .json()
            .await
            .map_err(|e| ConnectError::retrieval(format!("Failed to parse index description: {}", e)))?;
        Ok(Some(description))
    }

    async fn create(&self, spec: &IndexSpec) -> Result<()> {
        tracing::info!(
            index = %spec.name,
            dimension = spec.dimension,
            metric = %spec.metric,
            "Creating index"
        );
        let response = self
            .client
            .post(format!("{}/indexes", self.base_url))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&json!({
                "name": spec.name,
                "dimension": spec.dimension,
                "metric": spec.metric,
                "spec": {
                    "serverless": { "cloud": spec.cloud, "region": spec.region }
                }
            }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // Lost a race with another creator
            StatusCode::CONFLICT => {
                tracing::info!(index = %spec.name, "Index already exists");
                Ok(())
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(ConnectError::retrieval(format!(
                    "Create index {} failed ({}): {}",
                    spec.name, status, error_text
                )))
            }
        }
    }
}

/// Described hosts come without a scheme
fn normalize_host(host: &str) -> String {
    if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}
