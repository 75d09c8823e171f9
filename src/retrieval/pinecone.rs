//! Pinecone data-plane client
//!
//! Talks to one index host: `POST /query` and `POST /vectors/upsert`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::core::{Config, ConnectError, Result};
use crate::retrieval::{ScoredChunk, VectorIndex, VectorRecord};

/// Client bound to a single Pinecone index
#[derive(Clone)]
pub struct PineconeIndex {
    client: Client,
    host: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    namespace: &'a str,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

impl PineconeIndex {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            host: host.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Build from configuration; the index host and key must both be set
    pub fn from_config(config: &Config) -> Result<Self> {
        let host = config
            .pinecone
            .index_host
            .clone()
            .ok_or(ConnectError::MissingApiKey("PINECONE_INDEX_HOST"))?;
        Self::for_host(config, &host)
    }

    /// Build for a host resolved at runtime, e.g. by the control plane
    pub fn for_host(config: &Config, host: &str) -> Result<Self> {
        let api_key = config
            .pinecone
            .api_key
            .clone()
            .ok_or(ConnectError::MissingApiKey("PINECONE_API_KEY"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.openai.timeout_secs))
            .build()
            .map_err(|e| ConnectError::with_context("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ConnectError::retrieval(format!(
                "Pinecone {} failed ({}): {}",
                path, status, error_text
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
    ) -> Result<Vec<ScoredChunk>> {
        let request = QueryRequest {
            vector,
            top_k,
            namespace,
            include_metadata: true,
        };
        let response: QueryResponse = self
            .post("/query", &request)
            .await?
            .json()
            .await
            .map_err(|e| ConnectError::retrieval(format!("Failed to parse query response: {}", e)))?;

        Ok(response
            .matches
            .into_iter()
            .map(|m| ScoredChunk {
                text: m
                    .metadata
                    .as_ref()
                    .and_then(|meta| meta.get("text"))
                    .and_then(|t| t.as_str())
                    .map(str::to_string),
                id: m.id,
                score: m.score,
            })
            .collect())
    }

    async fn upsert(&self, records: &[VectorRecord], namespace: &str) -> Result<usize> {
        let vectors: Vec<serde_json::Value> = records
            .iter()
            .map(|r| {
                json!({
                    "id": r.id,
                    "values": r.values,
                    "metadata": { "text": r.text },
                })
            })
            .collect();

        let response: UpsertResponse = self
            .post(
                "/vectors/upsert",
                &json!({ "vectors": vectors, "namespace": namespace }),
            )
            .await?
            .json()
            .await
            .map_err(|e| ConnectError::retrieval(format!("Failed to parse upsert response: {}", e)))?;

        Ok(response.upserted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_query_sends_namespace_and_reads_metadata_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/query")
            .match_header("api-key", "pc-test")
            .match_body(Matcher::PartialJson(json!({
                "topK": 3,
                "namespace": "dc",
                "includeMetadata": true
            })))
            .with_status(200)
            .with_body(
                json!({
                    "matches": [
                        {"id": "dc_1", "score": 0.91, "metadata": {"text": "Red Cross shelters"}},
                        {"id": "dc_7", "score": 0.80}
                    ],
                    "namespace": "dc"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let index = PineconeIndex::new(server.url(), "pc-test");
        let matches = index.query(&[0.1, 0.2], 3, "dc").await.unwrap();

        mock.assert_async().await;
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].text.as_deref(), Some("Red Cross shelters"));
        assert_eq!(matches[1].text, None);
    }

    #[tokio::test]
    async fn test_upsert_reports_count() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/vectors/upsert")
            .match_body(Matcher::PartialJson(json!({
                "namespace": "dc",
                "vectors": [{"id": "dc_1", "metadata": {"text": "chunk"}}]
            })))
            .with_status(200)
            .with_body(r#"{"upsertedCount": 1}"#)
            .create_async()
            .await;

        let index = PineconeIndex::new(server.url(), "pc-test");
        let record = VectorRecord {
            id: "dc_1".to_string(),
            values: vec![0.5],
            text: "chunk".to_string(),
        };
        assert_eq!(index.upsert(&[record], "dc").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_http_failure_is_retrieval_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/query")
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let index = PineconeIndex::new(server.url(), "bad");
        let err = index.query(&[0.1], 3, "dc").await.unwrap_err();
        assert!(matches!(err, ConnectError::Retrieval(_)));
    }
}
