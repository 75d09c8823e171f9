//! Retrieval module - vector search over the relief corpus
//!
//! Each conversational turn embeds the raw user query, fetches the top-k
//! nearest chunks from one namespace of the index and hands their text to the
//! loop as a system message. There is no caching, deduplication or relevance
//! threshold.

pub mod control;
pub mod ingest;
pub mod pinecone;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::Result;

pub use control::{IndexSpec, PineconeControl};
pub use ingest::{chunk_text, Ingestor};
pub use pinecone::PineconeIndex;

/// Turns text into an embedding vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// A stored chunk returned by a similarity query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    /// Stored chunk text, absent when the record has no `text` metadata
    pub text: Option<String>,
}

/// A record to be written into the index
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub text: String,
}

/// Nearest-neighbour store partitioned by namespace
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn query(&self, vector: &[f32], top_k: usize, namespace: &str)
        -> Result<Vec<ScoredChunk>>;

    async fn upsert(&self, records: &[VectorRecord], namespace: &str) -> Result<usize>;
}

/// Embed-then-query step run before each completion
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    namespace: String,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        namespace: impl Into<String>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            namespace: namespace.into(),
            top_k,
        }
    }

    /// Retrieved chunk text for `query`, joined in rank order
    ///
    /// Returns `None` when nothing with stored text matched.
    pub async fn context_for(&self, query: &str) -> Result<Option<String>> {
        let vector = self.embedder.embed(query).await?;
        let matches = self
            .index
            .query(&vector, self.top_k, &self.namespace)
            .await?;

        tracing::debug!(
            namespace = %self.namespace,
            matches = matches.len(),
            "Retrieved context chunks"
        );

        let texts: Vec<String> = matches.into_iter().filter_map(|m| m.text).collect();
        if texts.is_empty() {
            return Ok(None);
        }
        Ok(Some(texts.join("\n\n")))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Embedder returning a constant vector and remembering its inputs
    #[derive(Default)]
    pub struct FixedEmbedder {
        pub seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(vec![0.5, 0.25])
        }
    }

    /// In-memory index returning canned matches and storing upserts
    #[derive(Default)]
    pub struct MemoryIndex {
        pub matches: Vec<ScoredChunk>,
        pub stored: Mutex<Vec<(String, VectorRecord)>>,
    }

    #[async_trait]
    impl VectorIndex for MemoryIndex {
        async fn query(
            &self,
            _vector: &[f32],
            top_k: usize,
            _namespace: &str,
        ) -> Result<Vec<ScoredChunk>> {
            Ok(self.matches.iter().take(top_k).cloned().collect())
        }

        async fn upsert(&self, records: &[VectorRecord], namespace: &str) -> Result<usize> {
            let mut stored = self.stored.lock().unwrap();
            for record in records {
                stored.push((namespace.to_string(), record.clone()));
            }
            Ok(records.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FixedEmbedder, MemoryIndex};
    use super::*;

    fn chunk(id: &str, text: Option<&str>) -> ScoredChunk {
        ScoredChunk {
            id: id.to_string(),
            score: 0.9,
            text: text.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_context_joins_matches_in_rank_order() {
        let embedder = Arc::new(FixedEmbedder::default());
        let index = Arc::new(MemoryIndex {
            matches: vec![
                chunk("dc_1", Some("Shelter A opens at 6pm.")),
                chunk("dc_2", None),
                chunk("dc_3", Some("Call 211 for help.")),
            ],
            ..Default::default()
        });
        let retriever = Retriever::new(embedder.clone(), index, "dc", 3);

        let context = retriever.context_for("where can I sleep").await.unwrap();
        assert_eq!(
            context.as_deref(),
            Some("Shelter A opens at 6pm.\n\nCall 211 for help.")
        );
        assert_eq!(embedder.seen.lock().unwrap().as_slice(), ["where can I sleep"]);
    }

    #[tokio::test]
    async fn test_no_text_means_no_context() {
        let retriever = Retriever::new(
            Arc::new(FixedEmbedder::default()),
            Arc::new(MemoryIndex::default()),
            "dc",
            3,
        );
        assert_eq!(retriever.context_for("anything").await.unwrap(), None);
    }
}
