//! Corpus ingestion
//!
//! Splits a text file into fixed-size chunks, embeds each one and writes it to
//! the index as `<namespace>_<n>` (1-based) with the chunk text as metadata.

use std::path::Path;
use std::sync::Arc;

use crate::core::{ConnectError, Result};
use crate::retrieval::{Embedder, VectorIndex, VectorRecord};

/// Split `text` into slices of at most `size` characters
///
/// Slices are counted in chars, so multi-byte text never splits mid code point.
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    if size == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Loads text files into the vector index
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    namespace: String,
    chunk_size: usize,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        namespace: impl Into<String>,
        chunk_size: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            namespace: namespace.into(),
            chunk_size,
        }
    }

    /// Ingest one file; returns the number of chunks written
    pub async fn ingest_file(&self, path: &Path) -> Result<usize> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            ConnectError::with_context(format!("Failed to read {}", path.display()), e)
        })?;
        self.ingest_text(&text).await
    }

    /// Ingest already-loaded text
    pub async fn ingest_text(&self, text: &str) -> Result<usize> {
        let chunks = chunk_text(text, self.chunk_size);
        let mut written = 0;

        for (i, chunk) in chunks.into_iter().enumerate() {
            let values = self.embedder.embed(&chunk).await?;
            tracing::debug!(chunk = i + 1, dimensions = values.len(), "Embedded chunk");

            let record = VectorRecord {
                id: format!("{}_{}", self.namespace, i + 1),
                values,
                text: chunk,
            };
            self.index
                .upsert(std::slice::from_ref(&record), &self.namespace)
                .await?;
            written += 1;
        }

        tracing::info!(
            namespace = %self.namespace,
            chunks = written,
            "Ingestion complete"
        );
        Ok(written)
    }
}
