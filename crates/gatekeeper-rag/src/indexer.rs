use std::sync::Arc;

use gatekeeper_core::traits::VectorStore;
use gatekeeper_core::types::Chunk;
use gatekeeper_core::{Error, Result};

pub struct Indexer {
    store: Arc<dyn VectorStore>,
}

impl Indexer {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Tag each chunk with its provenance and submit them as one batch.
    /// Returns the number of chunks indexed; on error nothing is reported as indexed.
    pub async fn index(&self, chunks: Vec<String>, source_id: &str) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let batch: Vec<Chunk> = chunks
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk { text, source_id: source_id.to_string(), index })
            .collect();
        self.store
            .index_documents(&batch)
            .await
            .map_err(|e| Error::Index(format!("{:#}", e)))?;
        tracing::info!(source_id, chunks = batch.len(), "chunks indexed");
        Ok(batch.len())
    }
}
